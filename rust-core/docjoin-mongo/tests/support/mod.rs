// SPDX-License-Identifier: PMPL-1.0-or-later
//! In-memory evaluator for compiled filters.
//!
//! Understands exactly the subset of Mongo the relationship paths produce:
//! `$and`, `$or`, `$eq`, `$ne`, `$in`, `$not`, and `$expr` over `$size`,
//! `$eq` and `$gt`. Joins are simulated by looking up related documents
//! through the foreign key and writing the matches under `uniqueField`.
//! Post-join stages are ignored.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap};

use docjoin_query::ParseResult;
use serde_json::Value;

#[derive(Debug, Default, Clone)]
pub struct Store {
    collections: HashMap<String, Vec<Value>>,
}

impl Store {
    pub fn insert(&mut self, collection: &str, doc: Value) {
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(doc);
    }

    /// `_id`s of the documents of `collection` that `result` selects.
    pub fn select_ids(&self, collection: &str, result: &ParseResult) -> BTreeSet<String> {
        self.select(collection, result)
            .iter()
            .filter_map(|doc| doc["_id"].as_str().map(str::to_string))
            .collect()
    }

    fn select(&self, collection: &str, result: &ParseResult) -> Vec<Value> {
        let docs = self.collections.get(collection).cloned().unwrap_or_default();
        docs.into_iter()
            .filter_map(|mut doc| {
                for branch in &result.relationships {
                    let info = &branch.relationship_info;
                    let keys = match doc.get(&info.field) {
                        Some(Value::Array(keys)) => keys.clone(),
                        Some(Value::Null) | None => Vec::new(),
                        Some(key) => vec![key.clone()],
                    };
                    let joined: Vec<Value> = self
                        .select(&info.from, &branch.query)
                        .into_iter()
                        .filter(|related| keys.contains(&related["_id"]))
                        .collect();
                    doc[info.unique_field.as_str()] = Value::Array(joined);
                }
                let keep = result
                    .match_term
                    .as_ref()
                    .map_or(true, |term| matches(&doc, term));
                keep.then_some(doc)
            })
            .collect()
    }
}

/// Evaluate a query predicate against one document.
pub fn matches(doc: &Value, predicate: &Value) -> bool {
    let Value::Object(clauses) = predicate else {
        panic!("predicate is not a mapping: {predicate}");
    };
    clauses.iter().all(|(key, operand)| match key.as_str() {
        "$and" => operand
            .as_array()
            .map_or(false, |terms| terms.iter().all(|t| matches(doc, t))),
        "$or" => operand
            .as_array()
            .map_or(false, |terms| terms.iter().any(|t| matches(doc, t))),
        "$expr" => evaluate(doc, operand) == Value::Bool(true),
        field => {
            let actual = doc.get(field).unwrap_or(&Value::Null);
            condition(actual, operand)
        }
    })
}

fn condition(actual: &Value, cond: &Value) -> bool {
    let Value::Object(ops) = cond else {
        return equals(actual, cond);
    };
    ops.iter().all(|(op, operand)| match op.as_str() {
        "$eq" => equals(actual, operand),
        "$ne" => !equals(actual, operand),
        "$in" => operand
            .as_array()
            .map_or(false, |set| set.iter().any(|v| equals(actual, v))),
        "$not" => !condition(actual, operand),
        other => panic!("unsupported operator {other}"),
    })
}

/// Mongo equality: an array field matches if it equals the operand or any
/// of its elements does.
fn equals(actual: &Value, expected: &Value) -> bool {
    actual == expected
        || matches!(actual, Value::Array(items) if items.iter().any(|item| item == expected))
}

fn evaluate(doc: &Value, expr: &Value) -> Value {
    match expr {
        Value::String(s) if s.starts_with('$') => {
            doc.get(&s[1..]).cloned().unwrap_or(Value::Null)
        }
        Value::Object(map) if map.len() == 1 => {
            let (op, args) = map.iter().next().map(|(k, v)| (k.as_str(), v)).unwrap();
            match op {
                "$size" => match evaluate(doc, args) {
                    Value::Array(items) => Value::from(items.len()),
                    _ => Value::from(0),
                },
                "$eq" | "$gt" => {
                    let args = args.as_array().expect("binary operator takes two arguments");
                    let lhs = evaluate(doc, &args[0]);
                    let rhs = evaluate(doc, &args[1]);
                    if op == "$eq" {
                        Value::Bool(lhs == rhs)
                    } else {
                        Value::Bool(lhs.as_f64() > rhs.as_f64())
                    }
                }
                other => panic!("unsupported expression {other}"),
            }
        }
        literal => literal.clone(),
    }
}
