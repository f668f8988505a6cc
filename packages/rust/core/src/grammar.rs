//! The Brick identifier grammar.
//!
//! A Brick ID is a category code (`KW`, `S` or `G`), a `-`, one or more
//! digits and an optional `.digits` sub-index: `KW-1`, `S-10.5`, `G-3`.
//! Matching is case-insensitive; the canonical form is uppercase.
//!
//! The compiled pattern is built once per process and only ever read, so the
//! router and the sanitizer share it without synchronization.

use std::sync::LazyLock;

use regex::Regex;

/// Category codes a Brick ID may start with.
pub const CATEGORIES: [&str; 3] = ["KW", "S", "G"];

static BRICK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:KW|S|G)-[0-9]+(?:\.[0-9]+)?").expect("valid regex")
});

static WHOLE_BRICK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:KW|S|G)-[0-9]+(?:\.[0-9]+)?$").expect("valid regex")
});

/// Whether `text` contains at least one Brick ID anywhere.
pub fn contains_identifier(text: &str) -> bool {
    BRICK_ID_RE.is_match(text)
}

/// Every non-overlapping Brick ID in `text`, left to right, in canonical form.
pub fn find_identifiers(text: &str) -> impl Iterator<Item = String> + '_ {
    BRICK_ID_RE
        .find_iter(text)
        .map(|m| m.as_str().to_ascii_uppercase())
}

/// Whether the whole of `text` is exactly one Brick ID.
pub fn is_identifier(text: &str) -> bool {
    WHOLE_BRICK_ID_RE.is_match(text)
}
