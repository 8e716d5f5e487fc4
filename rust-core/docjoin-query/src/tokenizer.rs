// SPDX-License-Identifier: PMPL-1.0-or-later
//! Collaborator seams.
//!
//! The compiler owns the recursive structure of a filter; everything that
//! depends on the storage backend is delegated through the traits below.
//! Errors a collaborator returns are propagated unchanged.

use std::sync::atomic::{AtomicU64, Ordering};

use serde_json::Value;

use crate::error::QueryError;
use crate::metadata::{ListMeta, ListMetadata};
use crate::path::QueryPath;
use crate::result::{FilterNode, PipelineStage, Predicate, RelationshipInfo};

/// Where a key being tokenized sits.
#[derive(Clone, Copy)]
pub struct TokenContext<'a> {
    pub metadata: &'a dyn ListMetadata,
    /// The list the enclosing mapping filters.
    pub list: &'a ListMeta,
    /// The mapping that holds the key.
    pub node: &'a FilterNode,
    /// Path of the key itself.
    pub path: &'a QueryPath,
}

impl<'a> TokenContext<'a> {
    /// Value stored under `key` in the enclosing mapping (`null` if absent).
    pub fn value(&self, key: &str) -> &'a Value {
        static NULL: Value = Value::Null;
        self.node.get(key).unwrap_or(&NULL)
    }
}

/// Turns one scalar field condition into a native predicate.
pub trait LeafTokenizer {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<Predicate, QueryError>;
}

/// Turns one result-shaping directive into a pipeline stage.
pub trait ModifierTokenizer {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<PipelineStage, QueryError>;
}

/// Builds the parent-level predicate that tests a joined relationship,
/// e.g. "at least one related record matched" for `_some`.
///
/// Returning `None` leaves the parent unconstrained by the branch.
pub trait RelationshipTokenizer {
    fn tokenize(
        &self,
        info: &RelationshipInfo,
        path: &QueryPath,
    ) -> Result<Option<Predicate>, QueryError>;
}

/// Converts a raw identity value into the store's identifier type.
pub trait IdentityCodec {
    fn encode(&self, raw: &Value, path: &QueryPath) -> Result<Value, QueryError>;
}

/// Produces correlation tokens for relationship branches. Tokens must not
/// repeat within one compile.
pub trait IdGenerator {
    fn generate(&self, seed: &str) -> String;
}

impl<F> IdGenerator for F
where
    F: Fn(&str) -> String,
{
    fn generate(&self, seed: &str) -> String {
        self(seed)
    }
}

/// Identity codec for stores whose identifiers are plain JSON values.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl IdentityCodec for PassthroughCodec {
    fn encode(&self, raw: &Value, _path: &QueryPath) -> Result<Value, QueryError> {
        Ok(raw.clone())
    }
}

/// Deterministic tokens: `<prefix>0`, `<prefix>1`, ...
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new("rel")
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn generate(&self, _seed: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{n}", self.prefix)
    }
}

/// Everything the parser delegates to. All members are required; there is
/// no built-in fallback for any of them.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub metadata: &'a dyn ListMetadata,
    pub leaf: &'a dyn LeafTokenizer,
    pub modifier: &'a dyn ModifierTokenizer,
    pub relationship: &'a dyn RelationshipTokenizer,
    pub identity: &'a dyn IdentityCodec,
    pub ids: &'a dyn IdGenerator,
}
