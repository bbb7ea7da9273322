//! Tag input handling. Names are resolved to tag rows by the store, inside
//! the transaction that writes the image.

use crate::models::Tag;

/// Splits a comma-separated tag input into trimmed, non-empty names.
/// Repeats are dropped, keeping the first occurrence. Matching is
/// case-sensitive, so "Cat" and "cat" are two names.
pub fn parse_tag_names(input: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in input.split(',').map(str::trim).filter(|n| !n.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

/// Joins tag names for the edit form, e.g. `"cat, dog"`.
pub fn tags_to_string(tags: &[Tag]) -> String {
    tags.iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
