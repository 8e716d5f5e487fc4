// SPDX-License-Identifier: PMPL-1.0-or-later
//! Filter tree parser.
//!
//! Walks a filter mapping key by key, dispatching on [`KeyKind`], and
//! merges what each key contributes with the joiner. Parsing is a pure
//! function of the filter, the metadata and the collaborators: results are
//! built bottom-up and never mutated once returned.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::classify::{classify, KeyKind};
use crate::config::ParserConfig;
use crate::error::QueryError;
use crate::exclusion;
use crate::joiner::Fragment;
use crate::metadata::{ListMeta, RelationshipField};
use crate::path::QueryPath;
use crate::result::{FilterNode, ParseResult, RelationshipBranch, RelationshipInfo};
use crate::shortcut;
use crate::tokenizer::{Collaborators, TokenContext};
use crate::Combinator;

/// Compiles filters against a fixed set of collaborators.
///
/// Holds no per-compile state, so one parser can serve concurrent compiles
/// as long as its collaborators allow shared use.
pub struct QueryParser<'a> {
    collab: Collaborators<'a>,
    config: ParserConfig,
}

impl<'a> QueryParser<'a> {
    /// Create a parser. Fails if `config` does not validate.
    pub fn new(collab: Collaborators<'a>, config: ParserConfig) -> Result<Self, QueryError> {
        config.validate()?;
        Ok(Self { collab, config })
    }

    /// Compile a top-level filter over `list`.
    pub fn compile(&self, list: &str, filter: &Value) -> Result<ParseResult, QueryError> {
        debug!(list, "Compiling filter");

        let result = self.parse(list, filter, &QueryPath::root(), None)?;

        debug!(
            list,
            relationships = result.relationships.len(),
            join_depth = result.join_depth(),
            stages = result.post_join_pipeline.len(),
            excluded = result.exclude_fields.len(),
            "Filter compiled"
        );
        Ok(result)
    }

    /// Parse `filter` as a mapping over `list` found at `path`.
    ///
    /// `include` names a to-many field that must not be excluded even if
    /// this level does not traverse it.
    pub fn parse(
        &self,
        list: &str,
        filter: &Value,
        path: &QueryPath,
        include: Option<&str>,
    ) -> Result<ParseResult, QueryError> {
        let Value::Object(node) = filter else {
            return Err(QueryError::type_mismatch("Object", filter, path));
        };
        let meta = self
            .collab
            .metadata
            .list(list)
            .ok_or_else(|| QueryError::UnknownList(list.to_string()))?;

        let mut result = self.parse_node(meta, node, path)?.into_result(Vec::<String>::new());
        result.exclude_fields =
            exclusion::resolve(meta.to_many_fields(), result.relationship_fields(), include);
        Ok(result)
    }

    /// Implicit conjunction of every key in `node`.
    fn parse_node(
        &self,
        list: &ListMeta,
        node: &FilterNode,
        path: &QueryPath,
    ) -> Result<Fragment, QueryError> {
        let fragments = node
            .iter()
            .map(|(key, value)| self.parse_key(list, node, key, value, &path.key(key.as_str())))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fragment::merge(fragments, Combinator::And))
    }

    fn parse_key(
        &self,
        list: &ListMeta,
        node: &FilterNode,
        key: &str,
        value: &Value,
        path: &QueryPath,
    ) -> Result<Fragment, QueryError> {
        let kind = classify(list, key, value, &self.config);
        trace!(key, path = %path, kind = kind.name(), "Classified filter key");

        match kind {
            KeyKind::Combinator(combinator) => self.parse_logical(list, combinator, value, path),
            KeyKind::Modifier => {
                let stage = self
                    .collab
                    .modifier
                    .tokenize(&self.context(list, node, path), key)?;
                Ok(Fragment::stage(stage))
            }
            KeyKind::Identity if value.is_object() => {
                let mut term = Map::with_capacity(1);
                term.insert(self.config.identity_db_field.clone(), value.clone());
                Ok(Fragment::term(Value::Object(term)))
            }
            KeyKind::Relationship(relationship) => {
                self.parse_relationship(relationship, key, value, path)
            }
            KeyKind::Identity | KeyKind::Leaf => {
                let term = self
                    .collab
                    .leaf
                    .tokenize(&self.context(list, node, path), key)?;
                Ok(Fragment::term(term))
            }
        }
    }

    fn parse_logical(
        &self,
        list: &ListMeta,
        combinator: Combinator,
        value: &Value,
        path: &QueryPath,
    ) -> Result<Fragment, QueryError> {
        let Value::Array(children) = value else {
            return Err(QueryError::type_mismatch("Array", value, path));
        };

        let fragments = children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                self.parse(&list.key, child, &path.index(i), None)
                    .map(Fragment::from)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Fragment::merge(fragments, combinator))
    }

    fn parse_relationship(
        &self,
        relationship: RelationshipField<'_>,
        key: &str,
        value: &Value,
        path: &QueryPath,
    ) -> Result<Fragment, QueryError> {
        let Value::Object(filter) = value else {
            return Err(QueryError::type_mismatch("Object", value, path));
        };

        if let Some(term) = shortcut::rewrite(
            &relationship,
            filter,
            &self.config.identity_key,
            self.collab.identity,
            path,
            self.config.shortcut_mode,
        )? {
            return Ok(Fragment::term(term));
        }

        let target = self
            .collab
            .metadata
            .list(relationship.ref_list)
            .ok_or_else(|| QueryError::UnknownList(relationship.ref_list.to_string()))?;

        // Tokens are handed out outermost first.
        let token = self.collab.ids.generate(key);
        let field = relationship.db_path().to_string();
        let info = RelationshipInfo {
            unique_field: format!("{token}_{field}"),
            field,
            from: target.collection.clone(),
            ref_list: target.key.clone(),
            cardinality: relationship.cardinality,
            quantifier: relationship.quantifier,
            token,
        };

        let query = self.parse(&target.key, value, path, None)?;
        let parent_term = self.collab.relationship.tokenize(&info, path)?;

        trace!(
            field = %info.field,
            token = %info.token,
            quantifier = %info.quantifier,
            "Relationship branch built"
        );

        Ok(Fragment::branch(
            parent_term,
            RelationshipBranch {
                relationship_info: info,
                query,
            },
        ))
    }

    fn context<'c>(
        &'c self,
        list: &'c ListMeta,
        node: &'c FilterNode,
        path: &'c QueryPath,
    ) -> TokenContext<'c> {
        TokenContext {
            metadata: self.collab.metadata,
            list,
            node,
            path,
        }
    }
}
