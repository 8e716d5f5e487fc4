// SPDX-License-Identifier: PMPL-1.0-or-later
//! Parser configuration.
//!
//! Defaults follow the filter dialect produced by the GraphQL layer:
//! - identity key `id`, stored as `_id`
//! - modifiers `$search $sortBy $orderBy $skip $first $count`
//! - relationship shortcuts applied per the documented table

use serde::{Deserialize, Serialize};

use crate::error::QueryError;
use crate::Combinator;

/// Which identity-only relationship filters are rewritten into direct
/// foreign-key comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShortcutMode {
    /// Apply every entry of the rewrite table.
    Table,
    /// Apply only rewrites that agree with the join on every dataset
    /// without dangling foreign keys, including empty and missing ones.
    Strict,
    /// Never rewrite; always build a relationship branch.
    Disabled,
}

/// Configuration for the filter parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Filter key naming the record identity.
    pub identity_key: String,
    /// Storage field the identity key maps to.
    pub identity_db_field: String,
    /// Keys that produce post-join stages instead of match terms.
    pub modifier_keys: Vec<String>,
    pub shortcut_mode: ShortcutMode,
}

impl ParserConfig {
    pub fn is_modifier(&self, key: &str) -> bool {
        self.modifier_keys.iter().any(|m| m == key)
    }

    /// Reject configurations under which key classification is ambiguous.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.identity_key.is_empty() {
            return Err(QueryError::InvalidConfig(
                "identity_key must not be empty".to_string(),
            ));
        }
        if self.identity_db_field.is_empty() {
            return Err(QueryError::InvalidConfig(
                "identity_db_field must not be empty".to_string(),
            ));
        }
        for key in &self.modifier_keys {
            if key.parse::<Combinator>().is_ok() || *key == self.identity_key {
                return Err(QueryError::InvalidConfig(format!(
                    "modifier key {key} collides with a reserved key"
                )));
            }
        }
        Ok(())
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            identity_key: "id".to_string(),
            identity_db_field: "_id".to_string(),
            modifier_keys: ["$search", "$sortBy", "$orderBy", "$skip", "$first", "$count"]
                .into_iter()
                .map(String::from)
                .collect(),
            shortcut_mode: ShortcutMode::Table,
        }
    }
}
