// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiler output: match terms, relationship branches and post-join stages.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::metadata::{Cardinality, Quantifier};

/// A backend-native boolean predicate (for example `{"age": {"$gt": 3}}`).
pub type Predicate = serde_json::Value;

/// An opaque pipeline stage descriptor (for example `{"$limit": 10}`).
pub type PipelineStage = serde_json::Value;

/// A filter mapping. Key order is the order the keys were written in.
pub type FilterNode = serde_json::Map<String, serde_json::Value>;

/// What the downstream join assembler needs to know about one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipInfo {
    /// Storage path of the foreign key on the current record.
    pub field: String,
    /// Collection holding the related records.
    pub from: String,
    /// List key of the related records.
    pub ref_list: String,
    pub cardinality: Cardinality,
    pub quantifier: Quantifier,
    /// Correlation token, unique within one compile.
    pub token: String,
    /// Name the join writes its per-parent array of matches under.
    pub unique_field: String,
}

/// A relationship sub-filter together with the metadata of its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipBranch {
    pub relationship_info: RelationshipInfo,
    #[serde(flatten)]
    pub query: ParseResult,
}

/// Result of compiling one filter mapping.
///
/// Built once by the parser and never mutated afterwards; the pipeline
/// assembler consumes it as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResult {
    /// Predicate evaluated without a join. Never a combinator over fewer
    /// than two terms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_term: Option<Predicate>,
    /// Result-shaping stages, in the order their modifiers were written.
    #[serde(default)]
    pub post_join_pipeline: Vec<PipelineStage>,
    #[serde(default)]
    pub relationships: Vec<RelationshipBranch>,
    /// To-many fields the projection must drop.
    #[serde(default)]
    pub exclude_fields: BTreeSet<String>,
}

impl ParseResult {
    /// Foreign-key paths of the relationships traversed at this level.
    pub fn relationship_fields(&self) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .map(|branch| branch.relationship_info.field.as_str())
    }

    /// Depth of the relationship tree (0 when nothing is joined).
    pub fn join_depth(&self) -> usize {
        self.relationships
            .iter()
            .map(|branch| 1 + branch.query.join_depth())
            .max()
            .unwrap_or(0)
    }

    /// Whether compiling produced no constraint and no stages at all.
    pub fn is_unconstrained(&self) -> bool {
        self.match_term.is_none()
            && self.post_join_pipeline.is_empty()
            && self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn branch(field: &str, token: &str, query: ParseResult) -> RelationshipBranch {
        RelationshipBranch {
            relationship_info: RelationshipInfo {
                field: field.to_string(),
                from: format!("{field}_collection"),
                ref_list: "Post".to_string(),
                cardinality: Cardinality::Many,
                quantifier: Quantifier::Some,
                token: token.to_string(),
                unique_field: format!("{token}_{field}"),
            },
            query,
        }
    }

    #[test]
    fn test_wire_shape() {
        let result = ParseResult {
            match_term: Some(json!({ "name": { "$eq": "a" } })),
            post_join_pipeline: vec![json!({ "$limit": 1 })],
            relationships: vec![branch("posts", "t1", ParseResult::default())],
            exclude_fields: ["friends".to_string()].into_iter().collect(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["matchTerm"], json!({ "name": { "$eq": "a" } }));
        assert_eq!(value["postJoinPipeline"], json!([{ "$limit": 1 }]));
        assert_eq!(value["excludeFields"], json!(["friends"]));
        let rel = &value["relationships"][0];
        assert_eq!(rel["relationshipInfo"]["uniqueField"], json!("t1_posts"));
        assert_eq!(rel["relationshipInfo"]["cardinality"], json!("many"));
        // the nested result is flattened next to relationshipInfo
        assert!(rel.get("postJoinPipeline").is_some());
        assert!(rel.get("matchTerm").is_none());

        let parsed: ParseResult = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, result);
    }

    #[test]
    fn test_join_depth() {
        let leaf = ParseResult::default();
        let mid = ParseResult {
            relationships: vec![branch("author", "t2", leaf)],
            ..Default::default()
        };
        let top = ParseResult {
            relationships: vec![
                branch("posts", "t1", mid),
                branch("tags", "t3", ParseResult::default()),
            ],
            ..Default::default()
        };
        assert_eq!(top.join_depth(), 2);
        assert_eq!(top.relationship_fields().collect::<Vec<_>>(), vec!["posts", "tags"]);
        assert!(!top.is_unconstrained());
        assert!(ParseResult::default().is_unconstrained());
    }
}
