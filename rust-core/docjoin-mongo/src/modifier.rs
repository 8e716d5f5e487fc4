// SPDX-License-Identifier: PMPL-1.0-or-later
//! Result-shaping directives as aggregation stages.

use docjoin_query::{
    ListMeta, ModifierTokenizer, ParserConfig, PipelineStage, QueryError, QueryPath, TokenContext,
};
use serde_json::{Map, Value};

use crate::leaf::single;

/// Modifier tokenizer emitting MongoDB aggregation stages.
///
/// | key        | value               | stage                              |
/// |------------|---------------------|------------------------------------|
/// | `$search`  | string              | `$match` on the search field, `^`-anchored, case-insensitive |
/// | `$orderBy` | `"<field>_ASC"`     | `$sort`                            |
/// | `$sortBy`  | array of the above  | one `$sort`, keys in order         |
/// | `$skip`    | non-negative int    | `$skip`                            |
/// | `$first`   | non-negative int    | `$limit`                           |
/// | `$count`   | string              | `$count`                           |
#[derive(Debug, Clone)]
pub struct MongoModifierTokenizer {
    identity_key: String,
    identity_db_field: String,
}

impl MongoModifierTokenizer {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            identity_key: config.identity_key.clone(),
            identity_db_field: config.identity_db_field.clone(),
        }
    }

    fn db_path<'l>(&'l self, list: &'l ListMeta, field: &str) -> Option<&'l str> {
        if field == self.identity_key {
            return Some(self.identity_db_field.as_str());
        }
        list.field(field)
            .filter(|f| !f.is_relationship())
            .map(|f| f.db_path())
    }

    /// Parse `"<field>_ASC"` / `"<field>_DESC"`.
    fn sort_key(
        &self,
        list: &ListMeta,
        value: &Value,
        path: &QueryPath,
    ) -> Result<(String, i32), QueryError> {
        let Value::String(spec) = value else {
            return Err(QueryError::type_mismatch("String", value, path));
        };
        let unsupported = || QueryError::UnsupportedOperator {
            operator: spec.clone(),
            path: path.clone(),
        };

        let (field, direction) = spec.rsplit_once('_').ok_or_else(unsupported)?;
        let direction = match direction {
            "ASC" => 1,
            "DESC" => -1,
            _ => return Err(unsupported()),
        };
        let db_path = self.db_path(list, field).ok_or_else(unsupported)?;
        Ok((db_path.to_string(), direction))
    }

    fn count(value: &Value, path: &QueryPath) -> Result<u64, QueryError> {
        value
            .as_u64()
            .ok_or_else(|| QueryError::type_mismatch("non-negative Integer", value, path))
    }
}

impl ModifierTokenizer for MongoModifierTokenizer {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<PipelineStage, QueryError> {
        let value = ctx.value(key);
        let path = ctx.path;

        match key {
            "$search" => {
                let Value::String(term) = value else {
                    return Err(QueryError::type_mismatch("String", value, path));
                };
                let field = ctx
                    .list
                    .field(ctx.list.search_field())
                    .map_or(ctx.list.search_field(), |f| f.db_path());
                let mut regex = Map::with_capacity(2);
                regex.insert(
                    "$regex".to_string(),
                    Value::String(format!("^{}", regex::escape(term))),
                );
                regex.insert("$options".to_string(), Value::String("i".to_string()));
                Ok(single("$match", single(field, Value::Object(regex))))
            }
            "$orderBy" => {
                let (field, direction) = self.sort_key(ctx.list, value, path)?;
                Ok(single("$sort", single(&field, direction.into())))
            }
            "$sortBy" => {
                let Value::Array(specs) = value else {
                    return Err(QueryError::type_mismatch("Array", value, path));
                };
                if specs.is_empty() {
                    // nothing to sort by: no stage
                    return Ok(Value::Null);
                }
                let mut keys = Map::with_capacity(specs.len());
                for (i, spec) in specs.iter().enumerate() {
                    let (field, direction) = self.sort_key(ctx.list, spec, &path.index(i))?;
                    keys.insert(field, direction.into());
                }
                Ok(single("$sort", Value::Object(keys)))
            }
            "$skip" => Ok(single("$skip", Self::count(value, path)?.into())),
            "$first" => Ok(single("$limit", Self::count(value, path)?.into())),
            "$count" => match value {
                Value::String(name) if !name.is_empty() => {
                    Ok(single("$count", Value::String(name.clone())))
                }
                _ => Err(QueryError::type_mismatch("String", value, path)),
            },
            _ => Err(QueryError::UnsupportedOperator {
                operator: key.to_string(),
                path: path.clone(),
            }),
        }
    }
}
