//! Prerequisite sanitization.
//!
//! The model's `prerequisites` field is treated as untrusted prose. The list
//! of identifiers is re-derived from scratch with the Brick ID grammar, so
//! whatever the model wrote ("KW-1 (Launch Catia) and S-5", "none", a
//! sentence) the exported field holds only canonical IDs or `-`.

use brickmapper_shared::MISSING_FIELD;

use crate::grammar;

/// Extract every Brick ID from `raw`, uppercase, in order, joined by `", "`.
///
/// Returns `-` when `raw` is empty, is `-`, or holds no identifier.
pub fn sanitize_prerequisites(raw: &str) -> String {
    let raw = raw.trim();
    if raw.is_empty() || raw == MISSING_FIELD {
        return MISSING_FIELD.to_string();
    }

    let ids: Vec<String> = grammar::find_identifiers(raw).collect();
    if ids.is_empty() {
        MISSING_FIELD.to_string()
    } else {
        ids.join(", ")
    }
}
