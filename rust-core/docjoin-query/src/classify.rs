// SPDX-License-Identifier: PMPL-1.0-or-later
//! Per-key classification.
//!
//! Each key of a filter mapping is classified exactly once, before the
//! parser recurses into its value.

use serde_json::Value;

use crate::config::ParserConfig;
use crate::metadata::{ListMeta, RelationshipField};
use crate::Combinator;

/// What a filter key means at its position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind<'a> {
    /// `AND` / `OR`.
    Combinator(Combinator),
    /// A result-shaping directive (`$orderBy`, `$first`, ...).
    Modifier,
    /// The record identity key.
    Identity,
    /// A relationship key with a mapping value.
    Relationship(RelationshipField<'a>),
    /// Anything else: left to the leaf tokenizer.
    Leaf,
}

impl KeyKind<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            KeyKind::Combinator(_) => "combinator",
            KeyKind::Modifier => "modifier",
            KeyKind::Identity => "identity",
            KeyKind::Relationship(_) => "relationship",
            KeyKind::Leaf => "leaf",
        }
    }
}

/// Classify `key` (holding `value`) within a mapping over `list`.
///
/// Precedence: combinator, modifier, identity, relationship, leaf. A
/// relationship key whose value is not a mapping is a leaf, as is a
/// mapping under a key that names no relationship.
pub fn classify<'a>(
    list: &'a ListMeta,
    key: &str,
    value: &Value,
    config: &ParserConfig,
) -> KeyKind<'a> {
    if let Ok(combinator) = key.parse::<Combinator>() {
        return KeyKind::Combinator(combinator);
    }
    if config.is_modifier(key) {
        return KeyKind::Modifier;
    }
    if key == config.identity_key {
        return KeyKind::Identity;
    }
    if value.is_object() {
        if let Some(relationship) = list.relationship(key) {
            return KeyKind::Relationship(relationship);
        }
    }
    KeyKind::Leaf
}
