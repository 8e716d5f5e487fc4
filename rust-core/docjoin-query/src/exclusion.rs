// SPDX-License-Identifier: PMPL-1.0-or-later
//! To-many field exclusion.
//!
//! A to-many relationship cannot be materialised inline without a join, so
//! a projection must drop every to-many field the filter did not traverse
//! and the caller did not ask to keep.

use std::collections::BTreeSet;

/// `to_many - (branch_fields ∪ {include})`.
pub fn resolve<'a, T, B>(to_many: T, branch_fields: B, include: Option<&'a str>) -> BTreeSet<String>
where
    T: IntoIterator<Item = &'a str>,
    B: IntoIterator<Item = &'a str>,
{
    let mut keep: BTreeSet<&str> = branch_fields.into_iter().collect();
    keep.extend(include);

    to_many
        .into_iter()
        .filter(|field| !keep.contains(field))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(fields: &[&str]) -> BTreeSet<String> {
        fields.iter().map(|f| f.to_string()).collect()
    }

    #[test]
    fn test_untraversed_fields_excluded() {
        let excluded = resolve(["x", "y", "z"], ["y"], None);
        assert_eq!(excluded, set(&["x", "z"]));
    }

    #[test]
    fn test_include_hint_kept() {
        let excluded = resolve(["x", "y", "z"], ["y"], Some("x"));
        assert_eq!(excluded, set(&["z"]));
    }

    #[test]
    fn test_include_hint_not_a_to_many_field() {
        let excluded = resolve(["x"], [], Some("title"));
        assert_eq!(excluded, set(&["x"]));
    }

    #[test]
    fn test_branch_fields_outside_to_many_are_ignored() {
        let excluded = resolve(["x", "y"], ["author", "author"], None);
        assert_eq!(excluded, set(&["x", "y"]));
    }

    #[test]
    fn test_no_to_many_fields() {
        assert!(resolve([], ["y"], Some("x")).is_empty());
    }
}
