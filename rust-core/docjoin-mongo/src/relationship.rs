// SPDX-License-Identifier: PMPL-1.0-or-later
//! Parent-level checks over joined relationship arrays.

use docjoin_query::{Predicate, QueryError, QueryPath, Quantifier, RelationshipInfo, RelationshipTokenizer};
use serde_json::json;

/// Tests the array a `$lookup` wrote under `uniqueField`:
///
/// - only: exactly one related record matched
/// - `_some`: at least one matched
/// - `_none`: none matched
/// - `_every`: as many matched as the foreign key references
#[derive(Debug, Clone, Copy, Default)]
pub struct MongoRelationshipTokenizer;

impl RelationshipTokenizer for MongoRelationshipTokenizer {
    fn tokenize(
        &self,
        info: &RelationshipInfo,
        _path: &QueryPath,
    ) -> Result<Option<Predicate>, QueryError> {
        let matched = json!({ "$size": format!("${}", info.unique_field) });
        let expr = match info.quantifier {
            Quantifier::Only => json!({ "$eq": [matched, 1] }),
            Quantifier::Some => json!({ "$gt": [matched, 0] }),
            Quantifier::None => json!({ "$eq": [matched, 0] }),
            Quantifier::Every => json!({
                "$eq": [matched, { "$size": format!("${}", info.field) }]
            }),
        };
        Ok(Some(json!({ "$expr": expr })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docjoin_query::Cardinality;

    fn info(quantifier: Quantifier) -> RelationshipInfo {
        RelationshipInfo {
            field: "tag_ids".to_string(),
            from: "tags".to_string(),
            ref_list: "Tag".to_string(),
            cardinality: Cardinality::Many,
            quantifier,
            token: "t1".to_string(),
            unique_field: "t1_tag_ids".to_string(),
        }
    }

    fn tokenize(quantifier: Quantifier) -> Predicate {
        MongoRelationshipTokenizer
            .tokenize(&info(quantifier), &QueryPath::root())
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_quantifier_checks() {
        assert_eq!(
            tokenize(Quantifier::Some),
            json!({ "$expr": { "$gt": [{ "$size": "$t1_tag_ids" }, 0] } })
        );
        assert_eq!(
            tokenize(Quantifier::None),
            json!({ "$expr": { "$eq": [{ "$size": "$t1_tag_ids" }, 0] } })
        );
        assert_eq!(
            tokenize(Quantifier::Only),
            json!({ "$expr": { "$eq": [{ "$size": "$t1_tag_ids" }, 1] } })
        );
        assert_eq!(
            tokenize(Quantifier::Every),
            json!({ "$expr": { "$eq": [{ "$size": "$t1_tag_ids" }, { "$size": "$tag_ids" }] } })
        );
    }
}
