// SPDX-License-Identifier: PMPL-1.0-or-later
//! Relationship shortcut optimizer.
//!
//! A relationship filter whose only key tests the related record's identity
//! can be answered from the foreign key stored on the current record, so
//! the join is skipped and a direct comparison is emitted instead:
//!
//! | predicate      | only / `_some` / `_every` | `_none`      |
//! |----------------|---------------------------|--------------|
//! | `id: v`        | `f == v`                  | `f != v`     |
//! | `id_not: v`    | `f != v`                  | no rewrite   |
//! | `id_in: S`     | `f ∈ S` (only, `_some`)   | no rewrite   |
//! | `id_not_in: S` | `f ∉ S` (only, `_every`)  | no rewrite   |
//!
//! [`ShortcutMode::Strict`] narrows this to the entries that agree with the
//! join on every dataset whose foreign keys all name existing records,
//! including empty arrays and missing foreign keys. A dangling foreign key
//! still matches the direct comparison but joins nothing.

use serde_json::{Map, Value};
use tracing::debug;

use crate::config::ShortcutMode;
use crate::error::QueryError;
use crate::metadata::{Quantifier, RelationshipField};
use crate::path::QueryPath;
use crate::result::{FilterNode, Predicate};
use crate::tokenizer::IdentityCodec;

/// Identity predicates a relationship filter may consist of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityPredicate {
    Equals,
    NotEquals,
    InSet,
    NotInSet,
}

impl IdentityPredicate {
    /// Recognise `<identity>`, `<identity>_not`, `<identity>_in` and
    /// `<identity>_not_in`.
    pub fn classify(key: &str, identity_key: &str) -> Option<Self> {
        match key.strip_prefix(identity_key)? {
            "" => Some(IdentityPredicate::Equals),
            "_not" => Some(IdentityPredicate::NotEquals),
            "_in" => Some(IdentityPredicate::InSet),
            "_not_in" => Some(IdentityPredicate::NotInSet),
            _ => None,
        }
    }

    fn is_set(self) -> bool {
        matches!(self, IdentityPredicate::InSet | IdentityPredicate::NotInSet)
    }
}

/// Comparison emitted on the foreign key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Ne,
    In,
    NotIn,
}

/// The rewrite table. `None` means "no shortcut": build the join.
pub fn plan(
    predicate: IdentityPredicate,
    quantifier: Quantifier,
    mode: ShortcutMode,
) -> Option<Comparison> {
    use IdentityPredicate::*;

    let comparison = match (predicate, quantifier) {
        (Equals, Quantifier::None) => Comparison::Ne,
        (Equals, _) => Comparison::Eq,
        (NotEquals, Quantifier::None) => return None,
        (NotEquals, _) => Comparison::Ne,
        (InSet, Quantifier::Only | Quantifier::Some) => Comparison::In,
        (NotInSet, Quantifier::Only | Quantifier::Every) => Comparison::NotIn,
        (InSet | NotInSet, _) => return None,
    };

    match mode {
        ShortcutMode::Table => Some(comparison),
        ShortcutMode::Disabled => None,
        ShortcutMode::Strict => matches!(
            (predicate, quantifier),
            (Equals, Quantifier::Only | Quantifier::Some | Quantifier::None)
                | (InSet, Quantifier::Only | Quantifier::Some)
                | (NotEquals | NotInSet, Quantifier::Every)
        )
        .then_some(comparison),
    }
}

/// Try to replace a relationship branch with a foreign-key comparison.
///
/// `filter` is the relationship's own mapping and `path` the path of the
/// relationship key. Returns `Ok(None)` when no rewrite applies; identity
/// values that the codec rejects are errors.
pub fn rewrite(
    relationship: &RelationshipField<'_>,
    filter: &FilterNode,
    identity_key: &str,
    codec: &dyn IdentityCodec,
    path: &QueryPath,
    mode: ShortcutMode,
) -> Result<Option<Predicate>, QueryError> {
    if filter.len() != 1 {
        return Ok(None);
    }
    let Some((key, value)) = filter.iter().next() else {
        return Ok(None);
    };
    let Some(predicate) = IdentityPredicate::classify(key, identity_key) else {
        return Ok(None);
    };
    let Some(comparison) = plan(predicate, relationship.quantifier, mode) else {
        return Ok(None);
    };

    let value_path = path.key(key.as_str());
    let operand = if predicate.is_set() {
        let Value::Array(items) = value else {
            return Ok(None);
        };
        if mode == ShortcutMode::Strict && items.iter().any(Value::is_null) {
            return Ok(None);
        }
        let encoded = items
            .iter()
            .enumerate()
            .map(|(i, item)| codec.encode(item, &value_path.index(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Value::Array(encoded)
    } else {
        if value.is_null() || value.is_object() || value.is_array() {
            return Ok(None);
        }
        codec.encode(value, &value_path)?
    };

    debug!(
        field = relationship.db_path(),
        quantifier = %relationship.quantifier,
        ?comparison,
        "Relationship filter rewritten to foreign-key comparison"
    );

    Ok(Some(compare(relationship.db_path(), comparison, operand)))
}

fn compare(field: &str, comparison: Comparison, operand: Value) -> Predicate {
    let condition = match comparison {
        Comparison::Eq => operator("$eq", operand),
        Comparison::Ne => operator("$ne", operand),
        Comparison::In => operator("$in", operand),
        Comparison::NotIn => operator("$not", operator("$in", operand)),
    };
    let mut term = Map::with_capacity(1);
    term.insert(field.to_string(), condition);
    Value::Object(term)
}

fn operator(op: &str, operand: Value) -> Value {
    let mut condition = Map::with_capacity(1);
    condition.insert(op.to_string(), operand);
    Value::Object(condition)
}
