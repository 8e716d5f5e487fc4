// SPDX-License-Identifier: PMPL-1.0-or-later
//! Docjoin Mongo
//!
//! MongoDB-flavoured collaborators for `docjoin-query`: leaf and modifier
//! tokenizers producing query documents and aggregation stages, a
//! `$size`-based relationship check, an ObjectId identity codec and a UUID
//! correlation-token generator.

pub mod identity;
pub mod ids;
pub mod leaf;
pub mod modifier;
pub mod relationship;

use docjoin_query::{
    Collaborators, IdGenerator, IdentityCodec, ListMetadata, ParserConfig, QueryError, QueryParser,
};

pub use identity::ObjectIdCodec;
pub use ids::UuidIdGenerator;
pub use leaf::{MongoLeafTokenizer, Operator};
pub use modifier::MongoModifierTokenizer;
pub use relationship::MongoRelationshipTokenizer;

/// The full set of Mongo collaborators, minus metadata.
#[derive(Debug, Clone)]
pub struct MongoAdapter<C = ObjectIdCodec, G = UuidIdGenerator> {
    leaf: MongoLeafTokenizer<C>,
    modifier: MongoModifierTokenizer,
    relationship: MongoRelationshipTokenizer,
    codec: C,
    ids: G,
}

impl MongoAdapter {
    /// ObjectId identities and UUID tokens.
    pub fn new(config: &ParserConfig) -> Self {
        Self::with_parts(ObjectIdCodec, UuidIdGenerator, config)
    }
}

impl<C, G> MongoAdapter<C, G>
where
    C: IdentityCodec + Clone,
    G: IdGenerator,
{
    pub fn with_parts(codec: C, ids: G, config: &ParserConfig) -> Self {
        Self {
            leaf: MongoLeafTokenizer::new(codec.clone(), config),
            modifier: MongoModifierTokenizer::new(config),
            relationship: MongoRelationshipTokenizer,
            codec,
            ids,
        }
    }

    pub fn collaborators<'a>(&'a self, metadata: &'a dyn ListMetadata) -> Collaborators<'a> {
        Collaborators {
            metadata,
            leaf: &self.leaf,
            modifier: &self.modifier,
            relationship: &self.relationship,
            identity: &self.codec,
            ids: &self.ids,
        }
    }

    /// A parser over `metadata`. The adapter must have been built from the
    /// same `config`.
    pub fn parser<'a>(
        &'a self,
        metadata: &'a dyn ListMetadata,
        config: ParserConfig,
    ) -> Result<QueryParser<'a>, QueryError> {
        QueryParser::new(self.collaborators(metadata), config)
    }
}
