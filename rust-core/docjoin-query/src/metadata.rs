// SPDX-License-Identifier: PMPL-1.0-or-later
//! List and field metadata.
//!
//! The compiler only ever reads metadata: which keys of a list are
//! relationships, what they point at, their cardinality and the name they
//! are stored under. [`ListMetadata`] is the seam; [`Schema`] is the
//! JSON-loadable implementation used by the CLI, benches and tests.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Number of records on the far side of a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cardinality {
    One,
    Many,
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::One => write!(f, "one"),
            Cardinality::Many => write!(f, "many"),
        }
    }
}

/// Quantifier carried by a relationship query key's suffix.
///
/// A to-one relationship is queried by its bare name (`Only`); a to-many
/// relationship must be queried through `_some`, `_every` or `_none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    Only,
    Some,
    Every,
    None,
}

impl Quantifier {
    /// The quantifiers that are spelled with a suffix.
    pub const SUFFIXED: [Quantifier; 3] = [Quantifier::Some, Quantifier::Every, Quantifier::None];

    pub fn suffix(self) -> &'static str {
        match self {
            Quantifier::Only => "",
            Quantifier::Some => "_some",
            Quantifier::Every => "_every",
            Quantifier::None => "_none",
        }
    }

    /// Split a query key into its base field name and quantifier.
    ///
    /// `"posts_some"` gives `("posts", Some)`; a key without a recognised
    /// suffix (or one that is nothing but the suffix) is returned whole
    /// with `Only`.
    pub fn split(key: &str) -> (&str, Quantifier) {
        for quantifier in Self::SUFFIXED {
            if let Some(base) = key.strip_suffix(quantifier.suffix()) {
                if !base.is_empty() {
                    return (base, quantifier);
                }
            }
        }
        (key, Quantifier::Only)
    }

    /// Whether this quantifier is legal for a relationship of `cardinality`.
    pub fn applies_to(self, cardinality: Cardinality) -> bool {
        match cardinality {
            Cardinality::One => self == Quantifier::Only,
            Cardinality::Many => self != Quantifier::Only,
        }
    }
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantifier::Only => write!(f, "only"),
            Quantifier::Some => write!(f, "some"),
            Quantifier::Every => write!(f, "every"),
            Quantifier::None => write!(f, "none"),
        }
    }
}

/// What a field holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FieldKind {
    Text,
    Number,
    Boolean,
    DateTime,
    Json,
    Relationship {
        #[serde(rename = "refList")]
        ref_list: String,
        #[serde(default)]
        many: bool,
    },
}

/// A single field of a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    /// Name used in filters.
    pub path: String,
    /// Name used in storage; defaults to `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_path: Option<String>,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldMeta {
    pub fn new(path: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            path: path.into(),
            db_path: None,
            kind,
        }
    }

    /// Builder-style override of the storage name.
    pub fn stored_as(mut self, db_path: impl Into<String>) -> Self {
        self.db_path = Some(db_path.into());
        self
    }

    pub fn db_path(&self) -> &str {
        self.db_path.as_deref().unwrap_or(&self.path)
    }

    pub fn is_relationship(&self) -> bool {
        matches!(self.kind, FieldKind::Relationship { .. })
    }

    /// Cardinality of a relationship field; `None` for scalars.
    pub fn cardinality(&self) -> Option<Cardinality> {
        match self.kind {
            FieldKind::Relationship { many: true, .. } => Some(Cardinality::Many),
            FieldKind::Relationship { many: false, .. } => Some(Cardinality::One),
            _ => None,
        }
    }
}

/// A relationship query key resolved against its list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipField<'a> {
    pub field: &'a FieldMeta,
    pub ref_list: &'a str,
    pub cardinality: Cardinality,
    pub quantifier: Quantifier,
}

impl RelationshipField<'_> {
    /// Storage path of the foreign key.
    pub fn db_path(&self) -> &str {
        self.field.db_path()
    }
}

/// Metadata for one list (collection) of records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    pub key: String,
    pub collection: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_field: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldMeta>,
}

impl ListMeta {
    pub fn new(key: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            collection: collection.into(),
            search_field: None,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldMeta) -> Self {
        self.fields.push(field);
        self
    }

    /// Field targeted by `$search`; `name` unless configured.
    pub fn search_field(&self) -> &str {
        self.search_field.as_deref().unwrap_or("name")
    }

    pub fn field(&self, path: &str) -> Option<&FieldMeta> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Resolve a query key to a relationship, honouring quantifier suffixes.
    ///
    /// Returns `None` when the key is not a relationship key, including the
    /// case of a known relationship spelled with a quantifier that does not
    /// fit its cardinality (`author_some` on a to-one field).
    pub fn relationship(&self, query_key: &str) -> Option<RelationshipField<'_>> {
        let (base, quantifier) = Quantifier::split(query_key);
        let candidates = [(base, quantifier), (query_key, Quantifier::Only)];
        candidates.into_iter().find_map(|(name, quantifier)| {
            let field = self.field(name)?;
            let FieldKind::Relationship { ref ref_list, .. } = field.kind else {
                return None;
            };
            let cardinality = field.cardinality()?;
            quantifier
                .applies_to(cardinality)
                .then_some(RelationshipField {
                    field,
                    ref_list: ref_list.as_str(),
                    cardinality,
                    quantifier,
                })
        })
    }

    /// Storage paths of every to-many relationship, in declaration order.
    pub fn to_many_fields(&self) -> Vec<&str> {
        self.fields
            .iter()
            .filter(|f| f.cardinality() == Some(Cardinality::Many))
            .map(FieldMeta::db_path)
            .collect()
    }
}

/// Read-only access to list metadata.
pub trait ListMetadata {
    /// Look up a list by key.
    fn list(&self, key: &str) -> Option<&ListMeta>;
}

#[derive(Deserialize)]
struct SchemaDef {
    lists: Vec<ListMeta>,
}

/// A validated set of lists.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    lists: HashMap<String, ListMeta>,
}

impl Schema {
    /// Build a schema, checking that keys are unique and every relationship
    /// points at a list that exists.
    pub fn new(lists: Vec<ListMeta>) -> Result<Self, QueryError> {
        let mut by_key = HashMap::with_capacity(lists.len());
        for list in lists {
            let mut seen = HashSet::new();
            for field in &list.fields {
                if !seen.insert(field.path.as_str()) {
                    return Err(QueryError::InvalidConfig(format!(
                        "list {} declares field {} twice",
                        list.key, field.path
                    )));
                }
            }
            if let Some(previous) = by_key.insert(list.key.clone(), list) {
                return Err(QueryError::InvalidConfig(format!(
                    "list {} declared twice",
                    previous.key
                )));
            }
        }

        for list in by_key.values() {
            for field in &list.fields {
                if let FieldKind::Relationship { ref_list, .. } = &field.kind {
                    if !by_key.contains_key(ref_list) {
                        return Err(QueryError::InvalidConfig(format!(
                            "{}.{} refers to unknown list {}",
                            list.key, field.path, ref_list
                        )));
                    }
                }
            }
        }

        Ok(Self { lists: by_key })
    }

    /// Parse a schema document of the form `{"lists": [ ... ]}`.
    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        let def: SchemaDef = serde_json::from_str(json)?;
        Self::new(def.lists)
    }

    pub fn from_value(value: serde_json::Value) -> Result<Self, QueryError> {
        let def: SchemaDef = serde_json::from_value(value)?;
        Self::new(def.lists)
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

impl ListMetadata for Schema {
    fn list(&self, key: &str) -> Option<&ListMeta> {
        self.lists.get(key)
    }
}
