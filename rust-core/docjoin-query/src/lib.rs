// SPDX-License-Identifier: PMPL-1.0-or-later
//! Docjoin Query
//!
//! Compiles nested, declarative record filters into the pieces a document
//! store pipeline is assembled from: a join-free match term, relationship
//! branches to join, post-join stages, and the to-many fields a projection
//! must drop. Storage-specific tokenizing is delegated to collaborators.

pub mod classify;
pub mod config;
pub mod depth;
pub mod error;
pub mod exclusion;
pub mod joiner;
pub mod metadata;
pub mod parser;
pub mod path;
pub mod result;
pub mod shortcut;
pub mod tokenizer;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use classify::KeyKind;
pub use config::{ParserConfig, ShortcutMode};
pub use depth::{ensure_max_depth, nesting_depth};
pub use error::QueryError;
pub use joiner::{join_terms, Fragment};
pub use metadata::{
    Cardinality, FieldKind, FieldMeta, ListMeta, ListMetadata, Quantifier, RelationshipField,
    Schema,
};
pub use parser::QueryParser;
pub use path::{PathSegment, QueryPath};
pub use result::{
    FilterNode, ParseResult, PipelineStage, Predicate, RelationshipBranch, RelationshipInfo,
};
pub use tokenizer::{
    Collaborators, IdGenerator, IdentityCodec, LeafTokenizer, ModifierTokenizer,
    PassthroughCodec, RelationshipTokenizer, SequentialIdGenerator, TokenContext,
};

/// Logical combinator keys of a filter mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Combinator {
    And,
    Or,
}

impl Combinator {
    pub const ALL: [Combinator; 2] = [Combinator::And, Combinator::Or];

    /// Operator the joined predicate is wrapped in.
    pub fn operator(self) -> &'static str {
        match self {
            Combinator::And => "$and",
            Combinator::Or => "$or",
        }
    }
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "AND"),
            Combinator::Or => write!(f, "OR"),
        }
    }
}

impl FromStr for Combinator {
    type Err = QueryError;

    /// Filter keys are case-sensitive: `and` is an ordinary field name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AND" => Ok(Combinator::And),
            "OR" => Ok(Combinator::Or),
            _ => Err(QueryError::UnknownCombinator(s.to_string())),
        }
    }
}
