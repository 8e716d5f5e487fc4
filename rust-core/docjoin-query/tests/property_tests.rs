// SPDX-License-Identifier: PMPL-1.0-or-later
//! Property-based tests for the filter compiler

use std::collections::BTreeSet;

use docjoin_query::joiner::{flatten_relationships, flatten_stages};
use docjoin_query::{
    exclusion, join_terms, Collaborators, Combinator, LeafTokenizer, ListMeta, ModifierTokenizer,
    ParseResult, ParserConfig, PassthroughCodec, PipelineStage, Predicate, QueryError,
    QueryParser, RelationshipInfo, RelationshipTokenizer, Schema, SequentialIdGenerator,
    TokenContext,
};
use docjoin_query::{Cardinality, QueryPath, Quantifier, RelationshipBranch};
use proptest::prelude::*;
use serde_json::{json, Value};

struct EqLeaf;

impl LeafTokenizer for EqLeaf {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<Predicate, QueryError> {
        Ok(json!({ key: { "$eq": ctx.value(key) } }))
    }
}

struct EchoModifier;

impl ModifierTokenizer for EchoModifier {
    fn tokenize(&self, ctx: &TokenContext<'_>, key: &str) -> Result<PipelineStage, QueryError> {
        Ok(json!({ key: ctx.value(key) }))
    }
}

struct NoParentTerm;

impl RelationshipTokenizer for NoParentTerm {
    fn tokenize(
        &self,
        _info: &RelationshipInfo,
        _path: &QueryPath,
    ) -> Result<Option<Predicate>, QueryError> {
        Ok(None)
    }
}

fn compile(filter: &Value) -> Result<ParseResult, QueryError> {
    let schema = Schema::new(vec![ListMeta::new("Item", "items")])?;
    let ids = SequentialIdGenerator::default();
    let collab = Collaborators {
        metadata: &schema,
        leaf: &EqLeaf,
        modifier: &EchoModifier,
        relationship: &NoParentTerm,
        identity: &PassthroughCodec,
        ids: &ids,
    };
    QueryParser::new(collab, ParserConfig::default())?.compile("Item", filter)
}

/// Arbitrary non-null predicate-like values
fn arb_term() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i64>().prop_map(Value::from),
        "[a-z]{1,8}".prop_map(Value::from),
        "[a-z]{1,8}".prop_map(|field| json!({ field: { "$eq": 1 } })),
    ]
}

fn arb_combinator() -> impl Strategy<Value = Combinator> {
    prop_oneof![Just(Combinator::And), Just(Combinator::Or)]
}

/// Leaf field names that cannot collide with reserved keys
fn arb_fields() -> impl Strategy<Value = BTreeSet<String>> {
    prop::collection::btree_set("f_[a-z]{1,6}", 1..8)
}

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        "[a-z ]{0,10}".prop_map(Value::from),
        prop::collection::vec(any::<i32>().prop_map(Value::from), 0..4).prop_map(Value::Array),
    ]
}

fn branch(field: &str) -> RelationshipBranch {
    RelationshipBranch {
        relationship_info: RelationshipInfo {
            field: field.to_string(),
            from: "items".to_string(),
            ref_list: "Item".to_string(),
            cardinality: Cardinality::Many,
            quantifier: Quantifier::Some,
            token: "t".to_string(),
            unique_field: format!("t_{field}"),
        },
        query: ParseResult::default(),
    }
}

proptest! {
    #[test]
    fn test_join_tie_break(
        terms in prop::collection::vec(arb_term(), 0..6),
        combinator in arb_combinator()
    ) {
        let joined = join_terms(terms.iter().cloned().map(Some), combinator);
        match terms.len() {
            0 => prop_assert!(joined.is_none()),
            1 => prop_assert_eq!(joined, Some(terms[0].clone())),
            _ => {
                let mut expected = serde_json::Map::new();
                expected.insert(combinator.operator().to_string(), Value::Array(terms.clone()));
                prop_assert_eq!(joined, Some(Value::Object(expected)));
            }
        }
    }

    #[test]
    fn test_absent_terms_are_ignored(
        terms in prop::collection::vec(prop::option::of(arb_term()), 0..8),
        combinator in arb_combinator()
    ) {
        let present: Vec<Option<Value>> = terms.iter().flatten().cloned().map(Some).collect();
        prop_assert_eq!(
            join_terms(terms.clone(), combinator),
            join_terms(present, combinator)
        );
    }

    #[test]
    fn test_exclusion_algebra(
        to_many in prop::collection::btree_set("[a-e]", 0..5),
        branches in prop::collection::vec("[a-g]", 0..5),
        include in prop::option::of("[a-g]")
    ) {
        let excluded = exclusion::resolve(
            to_many.iter().map(String::as_str),
            branches.iter().map(String::as_str),
            include.as_deref(),
        );

        let expected: BTreeSet<String> = to_many
            .iter()
            .filter(|f| !branches.contains(f) && include.as_ref() != Some(*f))
            .cloned()
            .collect();
        prop_assert_eq!(&excluded, &expected);
        prop_assert!(excluded.is_subset(&to_many));
        for field in &branches {
            prop_assert!(!excluded.contains(field));
        }
    }

    #[test]
    fn test_flattening_is_idempotent(
        groups in prop::collection::vec(
            prop::collection::vec(prop_oneof![Just(Value::Null), arb_term()], 0..4),
            0..4
        ),
        fields in prop::collection::vec(prop::collection::vec("[a-c]", 0..3), 0..3)
    ) {
        let flat = flatten_stages(groups);
        prop_assert!(flat.iter().all(|stage| !stage.is_null()));
        prop_assert_eq!(flatten_stages(vec![flat.clone()]), flat.clone());

        let branches: Vec<Vec<RelationshipBranch>> = fields
            .iter()
            .map(|group| group.iter().map(|f| branch(f)).collect())
            .collect();
        let total: usize = branches.iter().map(Vec::len).sum();
        let flat = flatten_relationships(branches);
        prop_assert_eq!(flat.len(), total);
        prop_assert_eq!(flatten_relationships(vec![flat.clone()]), flat);
    }

    #[test]
    fn test_modifiers_keep_input_order(
        modifiers in Just(vec!["$search", "$sortBy", "$orderBy", "$skip", "$first", "$count"])
            .prop_shuffle(),
        take in 1usize..=6,
        fields in arb_fields()
    ) {
        let mut filter = serde_json::Map::new();
        let mut leaves = fields.iter();
        for (i, modifier) in modifiers.iter().take(take).enumerate() {
            filter.insert(modifier.to_string(), json!(i));
            if let Some(field) = leaves.next() {
                filter.insert(field.clone(), json!(i));
            }
        }

        let result = compile(&Value::Object(filter)).unwrap();
        let stage_keys: Vec<String> = result
            .post_join_pipeline
            .iter()
            .filter_map(|stage| stage.as_object()?.keys().next().cloned())
            .collect();
        let expected: Vec<String> = modifiers.iter().take(take).map(|m| m.to_string()).collect();
        prop_assert_eq!(stage_keys, expected);
    }

    #[test]
    fn test_mapping_defaults_to_conjunction(
        fields in arb_fields(),
        value in any::<i64>()
    ) {
        let filter: serde_json::Map<String, Value> =
            fields.iter().map(|f| (f.clone(), json!(value))).collect();
        let result = compile(&Value::Object(filter)).unwrap();
        let term = result.match_term.unwrap();

        let leaves: Vec<Value> = if fields.len() == 1 {
            vec![term]
        } else {
            let conjunction = term.get("$and").and_then(Value::as_array).cloned();
            prop_assert!(conjunction.is_some());
            conjunction.unwrap_or_default()
        };
        prop_assert_eq!(leaves.len(), fields.len());
        let seen: BTreeSet<String> = leaves
            .iter()
            .filter_map(|leaf| leaf.as_object()?.keys().next().cloned())
            .collect();
        prop_assert_eq!(seen, fields);
    }

    #[test]
    fn test_non_mapping_root_is_rejected(value in arb_scalar()) {
        let err = compile(&value).unwrap_err();
        let is_object_mismatch =
            matches!(err, QueryError::TypeMismatch { expected: "Object", .. });
        prop_assert!(is_object_mismatch, "expected an Object type mismatch, got {}", err);
        prop_assert!(err.path().map(QueryPath::is_root).unwrap_or(false));
        prop_assert!(err.to_string().ends_with("at path <root>"));
    }
}
