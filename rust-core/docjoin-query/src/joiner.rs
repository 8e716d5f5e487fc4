// SPDX-License-Identifier: PMPL-1.0-or-later
//! Merging sibling results into one.
//!
//! Every key of a filter mapping, and every element of an `AND`/`OR` array,
//! compiles to a [`Fragment`]. Siblings are merged by a pure reducer: match
//! terms are joined under a combinator, stages and relationship branches
//! are concatenated in order.

use serde_json::{Map, Value};

use crate::result::{ParseResult, PipelineStage, Predicate, RelationshipBranch};
use crate::Combinator;

/// Join match terms under `combinator`.
///
/// Absent (and JSON `null`) terms are dropped first. No terms means no
/// constraint, a single term is returned unwrapped, and two or more are
/// wrapped as `{"$and": [...]}` / `{"$or": [...]}`.
pub fn join_terms<I>(terms: I, combinator: Combinator) -> Option<Predicate>
where
    I: IntoIterator<Item = Option<Predicate>>,
{
    let mut terms: Vec<Predicate> = terms
        .into_iter()
        .flatten()
        .filter(|term| !term.is_null())
        .collect();

    match terms.len() {
        0 => None,
        1 => terms.pop(),
        _ => {
            let mut wrapped = Map::with_capacity(1);
            wrapped.insert(combinator.operator().to_string(), Value::Array(terms));
            Some(Value::Object(wrapped))
        }
    }
}

/// Concatenate stage lists in order, dropping `null` entries.
pub fn flatten_stages<I>(groups: I) -> Vec<PipelineStage>
where
    I: IntoIterator<Item = Vec<PipelineStage>>,
{
    groups
        .into_iter()
        .flatten()
        .filter(|stage| !stage.is_null())
        .collect()
}

/// Concatenate relationship lists in order. Duplicates are kept: two
/// branches over the same field are independent joins.
pub fn flatten_relationships<I>(groups: I) -> Vec<RelationshipBranch>
where
    I: IntoIterator<Item = Vec<RelationshipBranch>>,
{
    groups.into_iter().flatten().collect()
}

/// A [`ParseResult`] before field exclusion has been resolved.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    pub match_term: Option<Predicate>,
    pub post_join_pipeline: Vec<PipelineStage>,
    pub relationships: Vec<RelationshipBranch>,
}

impl Fragment {
    pub fn term(predicate: Predicate) -> Self {
        Self {
            match_term: Some(predicate),
            ..Default::default()
        }
    }

    pub fn stage(stage: PipelineStage) -> Self {
        Self {
            post_join_pipeline: vec![stage],
            ..Default::default()
        }
    }

    /// A relationship branch plus the parent-level term that tests it.
    pub fn branch(match_term: Option<Predicate>, branch: RelationshipBranch) -> Self {
        Self {
            match_term,
            post_join_pipeline: Vec::new(),
            relationships: vec![branch],
        }
    }

    /// Merge siblings: terms joined under `combinator`, the rest concatenated.
    pub fn merge<I>(fragments: I, combinator: Combinator) -> Self
    where
        I: IntoIterator<Item = Fragment>,
    {
        let mut terms = Vec::new();
        let mut stages = Vec::new();
        let mut relationships = Vec::new();
        for fragment in fragments {
            terms.push(fragment.match_term);
            stages.push(fragment.post_join_pipeline);
            relationships.push(fragment.relationships);
        }

        Self {
            match_term: join_terms(terms, combinator),
            post_join_pipeline: flatten_stages(stages),
            relationships: flatten_relationships(relationships),
        }
    }

    /// Finish this fragment with its resolved exclusions.
    pub fn into_result(self, exclude_fields: impl IntoIterator<Item = String>) -> ParseResult {
        ParseResult {
            match_term: self.match_term,
            post_join_pipeline: self.post_join_pipeline,
            relationships: self.relationships,
            exclude_fields: exclude_fields.into_iter().collect(),
        }
    }
}

impl From<ParseResult> for Fragment {
    /// Exclusions are per level, so they do not survive being merged upward.
    fn from(result: ParseResult) -> Self {
        Self {
            match_term: result.match_term,
            post_join_pipeline: result.post_join_pipeline,
            relationships: result.relationships,
        }
    }
}
