// SPDX-License-Identifier: PMPL-1.0-or-later
//! Random correlation tokens.

use docjoin_query::IdGenerator;
use uuid::Uuid;

/// Generates `<seed>_<uuid>` tokens from random (v4) UUIDs.
///
/// The seed is reduced to ASCII alphanumerics and `_` so the token can be
/// used inside a field name.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self, seed: &str) -> String {
        let id = Uuid::new_v4().simple().to_string();
        let seed: String = seed
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
            .collect();
        if seed.is_empty() {
            id
        } else {
            format!("{seed}_{id}")
        }
    }
}
