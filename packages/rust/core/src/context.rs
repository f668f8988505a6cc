//! Renders retrieved passages into the single context block the model reads.

use brickmapper_shared::RetrievedPassage;

/// Emitted in place of context when retrieval returned nothing.
pub const NO_CONTEXT: &str = "No relevant context found.";

const DEFAULT_CHUNK_TYPE: &str = "General Info";
const DEFAULT_SOURCE_ID: &str = "Unknown ID";

/// Format passages in the order received, one numbered section per passage.
///
/// Each section header names the source Brick and the uppercased chunk type
/// so the model can tell a Brick's purpose apart from its dependencies.
pub fn format_context(passages: &[RetrievedPassage]) -> String {
    if passages.is_empty() {
        return NO_CONTEXT.to_string();
    }

    passages
        .iter()
        .enumerate()
        .map(|(i, passage)| {
            let meta = &passage.metadata;
            let section = meta
                .chunk_type
                .as_deref()
                .unwrap_or(DEFAULT_CHUNK_TYPE)
                .to_uppercase();
            let source = meta.source_id.as_deref().unwrap_or(DEFAULT_SOURCE_ID);

            format!(
                "--- SOURCE {}: Brick {source} [{section}] ---\n{}",
                i + 1,
                single_line(&passage.content)
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn single_line(content: &str) -> String {
    content.replace(['\r', '\n'], " ").trim().to_string()
}
