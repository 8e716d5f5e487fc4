// SPDX-License-Identifier: PMPL-1.0-or-later
//! Scalar field conditions.
//!
//! A leaf key is `<field><suffix>`, e.g. `age_gte` or `name_not_contains_i`.
//! A key that names a field exactly is plain equality on that field.
//! Otherwise the longest suffix whose base names a field of the list wins,
//! so with fields `name` and `name_not`, `name_not` is equality on
//! `name_not` and `name_not_not` is its negation.

use docjoin_query::{
    FieldKind, FieldMeta, IdentityCodec, LeafTokenizer, ListMeta, ParserConfig, Predicate,
    QueryError, QueryPath, TokenContext,
};
use serde_json::{Map, Value};
use tracing::trace;

/// Where a text pattern is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// The whole value (case-insensitive equality).
    Exact,
    Contains,
    StartsWith,
    EndsWith,
}

/// A comparison a leaf key asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    In,
    NotIn,
    Lt,
    Lte,
    Gt,
    Gte,
    Text {
        anchor: Anchor,
        negated: bool,
        insensitive: bool,
    },
}

const fn text(anchor: Anchor, negated: bool, insensitive: bool) -> Operator {
    Operator::Text {
        anchor,
        negated,
        insensitive,
    }
}

/// Every recognised suffix.
const SUFFIXES: [(&str, Operator); 22] = [
    ("", Operator::Eq),
    ("_not", Operator::Ne),
    ("_in", Operator::In),
    ("_not_in", Operator::NotIn),
    ("_lt", Operator::Lt),
    ("_lte", Operator::Lte),
    ("_gt", Operator::Gt),
    ("_gte", Operator::Gte),
    ("_i", text(Anchor::Exact, false, true)),
    ("_not_i", text(Anchor::Exact, true, true)),
    ("_contains", text(Anchor::Contains, false, false)),
    ("_not_contains", text(Anchor::Contains, true, false)),
    ("_contains_i", text(Anchor::Contains, false, true)),
    ("_not_contains_i", text(Anchor::Contains, true, true)),
    ("_starts_with", text(Anchor::StartsWith, false, false)),
    ("_not_starts_with", text(Anchor::StartsWith, true, false)),
    ("_starts_with_i", text(Anchor::StartsWith, false, true)),
    ("_not_starts_with_i", text(Anchor::StartsWith, true, true)),
    ("_ends_with", text(Anchor::EndsWith, false, false)),
    ("_not_ends_with", text(Anchor::EndsWith, true, false)),
    ("_ends_with_i", text(Anchor::EndsWith, false, true)),
    ("_not_ends_with_i", text(Anchor::EndsWith, true, true)),
];

impl Operator {
    fn is_ordering(self) -> bool {
        matches!(self, Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte)
    }

    fn is_equality(self) -> bool {
        matches!(self, Operator::Eq | Operator::Ne | Operator::In | Operator::NotIn)
    }

    /// Whether this operator can be applied to a field of `kind`.
    pub fn applies_to(self, kind: &FieldKind) -> bool {
        match kind {
            FieldKind::Text => true,
            FieldKind::Number | FieldKind::DateTime => self.is_equality() || self.is_ordering(),
            FieldKind::Boolean | FieldKind::Json | FieldKind::Relationship { .. } => {
                self.is_equality()
            }
        }
    }
}

/// What a leaf key resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    /// The record identity.
    Identity,
    Field(&'a FieldMeta),
}

/// Leaf tokenizer emitting MongoDB query documents.
///
/// Identity values, and values compared against relationship foreign keys,
/// go through the identity codec.
#[derive(Debug, Clone)]
pub struct MongoLeafTokenizer<C> {
    codec: C,
    identity_key: String,
    identity_db_field: String,
}

impl<C: IdentityCodec> MongoLeafTokenizer<C> {
    pub fn new(codec: C, config: &ParserConfig) -> Self {
        Self {
            codec,
            identity_key: config.identity_key.clone(),
            identity_db_field: config.identity_db_field.clone(),
        }
    }

    /// Split `key` into its target and operator. An exact field name takes
    /// precedence over any suffix split.
    pub fn resolve<'l>(&self, list: &'l ListMeta, key: &str) -> Option<(Target<'l>, Operator)> {
        let mut best: Option<(usize, Target<'l>, Operator)> = None;

        for (suffix, op) in SUFFIXES {
            let Some(base) = key.strip_suffix(suffix) else {
                continue;
            };
            let target = if base == self.identity_key {
                if !op.is_equality() {
                    continue;
                }
                Target::Identity
            } else {
                match list.field(base) {
                    Some(field) if op.applies_to(&field.kind) => Target::Field(field),
                    _ => continue,
                }
            };
            if suffix.is_empty() {
                return Some((target, op));
            }
            if best.map_or(true, |(len, _, _)| suffix.len() > len) {
                best = Some((suffix.len(), target, op));
            }
        }

        best.map(|(_, target, op)| (target, op))
    }

    fn encode(&self, value: &Value, path: &QueryPath) -> Result<Value, QueryError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        self.codec.encode(value, path)
    }

    fn condition(
        &self,
        target: Target<'_>,
        op: Operator,
        value: &Value,
        path: &QueryPath,
    ) -> Result<Value, QueryError> {
        let encoded = matches!(target, Target::Identity)
            || matches!(target, Target::Field(field) if field.is_relationship());

        match op {
            Operator::Eq | Operator::Ne => {
                let value = if encoded {
                    self.encode(value, path)?
                } else {
                    value.clone()
                };
                let name = if op == Operator::Eq { "$eq" } else { "$ne" };
                Ok(single(name, value))
            }
            Operator::In | Operator::NotIn => {
                let Value::Array(items) = value else {
                    return Err(QueryError::type_mismatch("Array", value, path));
                };
                let items = if encoded {
                    items
                        .iter()
                        .enumerate()
                        .map(|(i, item)| self.encode(item, &path.index(i)))
                        .collect::<Result<Vec<_>, _>>()?
                } else {
                    items.clone()
                };
                let set = single("$in", Value::Array(items));
                Ok(if op == Operator::In {
                    set
                } else {
                    single("$not", set)
                })
            }
            Operator::Lt | Operator::Lte | Operator::Gt | Operator::Gte => {
                let expected = match target {
                    Target::Field(FieldMeta {
                        kind: FieldKind::Number,
                        ..
                    }) => "Number",
                    _ => "String",
                };
                let valid = match expected {
                    "Number" => value.is_number(),
                    _ => value.is_string(),
                };
                if !valid {
                    return Err(QueryError::type_mismatch(expected, value, path));
                }
                let name = match op {
                    Operator::Lt => "$lt",
                    Operator::Lte => "$lte",
                    Operator::Gt => "$gt",
                    _ => "$gte",
                };
                Ok(single(name, value.clone()))
            }
            Operator::Text {
                anchor,
                negated,
                insensitive,
            } => {
                let Value::String(text) = value else {
                    return Err(QueryError::type_mismatch("String", value, path));
                };
                let escaped = regex::escape(text);
                let pattern = match anchor {
                    Anchor::Exact => format!("^{escaped}$"),
                    Anchor::Contains => escaped,
                    Anchor::StartsWith => format!("^{escaped}"),
                    Anchor::EndsWith => format!("{escaped}$"),
                };
                let mut regex = Map::with_capacity(2);
                regex.insert("$regex".to_string(), Value::String(pattern));
                if insensitive {
                    regex.insert("$options".to_string(), Value::String("i".to_string()));
                }
                let regex = Value::Object(regex);
                Ok(if negated { single("$not", regex) } else { regex })
            }
        }
    }
}

impl<C: IdentityCodec> LeafTokenizer for MongoLeafTokenizer<C> {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<Predicate, QueryError> {
        let (target, op) =
            self.resolve(ctx.list, key)
                .ok_or_else(|| QueryError::UnsupportedOperator {
                    operator: key.to_string(),
                    path: ctx.path.clone(),
                })?;
        trace!(key, ?op, list = %ctx.list.key, "Leaf resolved");

        let field = match target {
            Target::Identity => self.identity_db_field.as_str(),
            Target::Field(field) => field.db_path(),
        };
        let condition = self.condition(target, op, ctx.value(key), ctx.path)?;
        Ok(single(field, condition))
    }
}

/// `{key: value}`
pub(crate) fn single(key: &str, value: Value) -> Value {
    let mut map = Map::with_capacity(1);
    map.insert(key.to_string(), value);
    Value::Object(map)
}
