// SPDX-License-Identifier: PMPL-1.0-or-later
//! Compiler error types.

use thiserror::Error;

use crate::path::QueryPath;

/// Errors that can occur while compiling a filter.
///
/// Tokenizer collaborators return these directly; the parser propagates
/// them unchanged, so a failure deep in a relationship branch still carries
/// the path of the offending fragment.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("expected {expected} for query, got {found} at path {path}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
        path: QueryPath,
    },

    #[error("unsupported operator {operator} at path {path}")]
    UnsupportedOperator { operator: String, path: QueryPath },

    #[error("invalid identifier {value} at path {path}: {reason}")]
    InvalidIdentifier {
        value: String,
        path: QueryPath,
        reason: String,
    },

    #[error("unknown list: {0}")]
    UnknownList(String),

    #[error("unknown combinator: {0}")]
    UnknownCombinator(String),

    #[error("filter nesting depth {depth} exceeds maximum of {max}")]
    DepthExceeded { depth: usize, max: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// Shorthand for a [`QueryError::TypeMismatch`] against a JSON value.
    pub fn type_mismatch(
        expected: &'static str,
        value: &serde_json::Value,
        path: &QueryPath,
    ) -> Self {
        QueryError::TypeMismatch {
            expected,
            found: json_type_name(value),
            path: path.clone(),
        }
    }

    /// The path of the offending filter fragment, when the error has one.
    pub fn path(&self) -> Option<&QueryPath> {
        match self {
            QueryError::TypeMismatch { path, .. }
            | QueryError::UnsupportedOperator { path, .. }
            | QueryError::InvalidIdentifier { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Name of a JSON value's type, as used in diagnostics.
pub fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "Null",
        serde_json::Value::Bool(_) => "Boolean",
        serde_json::Value::Number(_) => "Number",
        serde_json::Value::String(_) => "String",
        serde_json::Value::Array(_) => "Array",
        serde_json::Value::Object(_) => "Object",
    }
}
