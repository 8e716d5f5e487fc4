// SPDX-License-Identifier: PMPL-1.0-or-later
//! Nesting-depth guard for untrusted filters.
//!
//! The parser recurses once per nested mapping or array, so an adversarial
//! filter can exhaust the stack. The parser itself does not check depth;
//! callers run [`ensure_max_depth`] on user input before compiling.

use serde_json::Value;

use crate::error::QueryError;

/// Nesting depth of a JSON value: scalars are 0, each enclosing mapping or
/// array adds one.
///
/// Walks iteratively so that measuring a hostile value cannot itself
/// overflow the stack.
pub fn nesting_depth(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending: Vec<(&Value, usize)> = vec![(value, 0)];

    while let Some((value, depth)) = pending.pop() {
        match value {
            Value::Object(map) => {
                deepest = deepest.max(depth + 1);
                pending.extend(map.values().map(|child| (child, depth + 1)));
            }
            Value::Array(items) => {
                deepest = deepest.max(depth + 1);
                pending.extend(items.iter().map(|child| (child, depth + 1)));
            }
            _ => deepest = deepest.max(depth),
        }
    }

    deepest
}

/// Fail with [`QueryError::DepthExceeded`] when `value` nests deeper than `max`.
pub fn ensure_max_depth(value: &Value, max: usize) -> Result<(), QueryError> {
    let depth = nesting_depth(value);
    if depth > max {
        return Err(QueryError::DepthExceeded { depth, max });
    }
    Ok(())
}
