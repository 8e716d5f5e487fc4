// SPDX-License-Identifier: PMPL-1.0-or-later
//! ObjectId identity codec.

use docjoin_query::{IdentityCodec, QueryError, QueryPath};
use serde_json::{Map, Value};

/// Length of an ObjectId in hex digits.
const OBJECT_ID_HEX_LEN: usize = 24;

/// Encodes identity values as MongoDB extended-JSON ObjectIds
/// (`{"$oid": "<24 hex digits>"}`).
///
/// Accepts a hex string of the right length, or a value that is already
/// in `$oid` form. Hex digits are normalised to lowercase.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectIdCodec;

impl ObjectIdCodec {
    fn parse_hex(hex: &str) -> Result<String, &'static str> {
        if hex.len() != OBJECT_ID_HEX_LEN {
            return Err("expected 24 hexadecimal digits");
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err("contains non-hexadecimal characters");
        }
        Ok(hex.to_ascii_lowercase())
    }
}

impl IdentityCodec for ObjectIdCodec {
    fn encode(&self, raw: &Value, path: &QueryPath) -> Result<Value, QueryError> {
        let hex = match raw {
            Value::String(hex) => Self::parse_hex(hex),
            Value::Object(map) if map.len() == 1 => match map.get("$oid") {
                Some(Value::String(hex)) => Self::parse_hex(hex),
                _ => Err("expected a string or {\"$oid\": string}"),
            },
            _ => Err("expected a string or {\"$oid\": string}"),
        };

        match hex {
            Ok(hex) => {
                let mut oid = Map::with_capacity(1);
                oid.insert("$oid".to_string(), Value::String(hex));
                Ok(Value::Object(oid))
            }
            Err(reason) => Err(QueryError::InvalidIdentifier {
                value: raw.to_string(),
                path: path.clone(),
                reason: reason.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_hex_string() {
        let encoded = ObjectIdCodec
            .encode(&json!("5F2B6C0E9D1A4B3C2D1E0F10"), &QueryPath::root())
            .unwrap();
        assert_eq!(encoded, json!({ "$oid": "5f2b6c0e9d1a4b3c2d1e0f10" }));
    }

    #[test]
    fn test_already_encoded_is_accepted() {
        let raw = json!({ "$oid": "5f2b6c0e9d1a4b3c2d1e0f10" });
        assert_eq!(ObjectIdCodec.encode(&raw, &QueryPath::root()).unwrap(), raw);
    }

    #[test]
    fn test_rejects_bad_identifiers() {
        let path = QueryPath::root().key("author").key("id");
        for raw in [
            json!("abc"),
            json!("zz2b6c0e9d1a4b3c2d1e0f10"),
            json!(42),
            json!(null),
            json!({ "$oid": 1 }),
        ] {
            match ObjectIdCodec.encode(&raw, &path) {
                Err(QueryError::InvalidIdentifier { path: at, .. }) => {
                    assert_eq!(at.to_string(), "author.id")
                }
                other => panic!("expected InvalidIdentifier for {raw}, got {other:?}"),
            }
        }
    }
}
