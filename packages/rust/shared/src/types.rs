//! Core domain types for the Brick extraction pipeline.

use serde::{Deserialize, Deserializer, Serialize};

/// Placeholder for any field the model left unknown or empty.
pub const MISSING_FIELD: &str = "-";

// ---------------------------------------------------------------------------
// RetrievedPassage
// ---------------------------------------------------------------------------

/// One ranked passage returned by a retrieval index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage text as stored in the index.
    #[serde(alias = "page_content")]
    pub content: String,
    /// Index-side metadata. Every field is optional on the wire.
    #[serde(default)]
    pub metadata: PassageMetadata,
}

/// Metadata attached to a [`RetrievedPassage`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassageMetadata {
    /// Semantic role of the chunk (e.g. `purpose`, `dependencies`, `parameters`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_type: Option<String>,
    /// Brick the chunk was cut from.
    #[serde(default, alias = "id", skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl RetrievedPassage {
    /// Convenience constructor used by adapters and tests.
    pub fn new(
        content: impl Into<String>,
        chunk_type: Option<&str>,
        source_id: Option<&str>,
    ) -> Self {
        Self {
            content: content.into(),
            metadata: PassageMetadata {
                chunk_type: chunk_type.map(String::from),
                source_id: source_id.map(String::from),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// PromptMessages
// ---------------------------------------------------------------------------

/// The (system, user) message pair sent to the language model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptMessages {
    /// Fixed extraction instructions, identical for every row.
    pub system: &'static str,
    /// Retrieval context plus the target operation.
    pub user: String,
}

// ---------------------------------------------------------------------------
// Brick / ParsedResponse
// ---------------------------------------------------------------------------

/// A Brick as extracted by the model. `prerequisites` is still untrusted text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Brick {
    #[serde(default = "missing_field", deserialize_with = "lenient_text")]
    pub id: String,
    #[serde(default = "missing_field", deserialize_with = "lenient_text")]
    pub name: String,
    #[serde(default = "missing_field", deserialize_with = "lenient_text")]
    pub prerequisites: String,
}

impl Brick {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        prerequisites: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            prerequisites: prerequisites.into(),
        }
    }
}

/// Structured model output. `bricks` is always present, possibly empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedResponse {
    #[serde(default)]
    pub bricks: Vec<Brick>,
}

fn missing_field() -> String {
    MISSING_FIELD.to_string()
}

/// Accept whatever JSON the model put in a Brick field and turn it into text.
///
/// `null` and blank strings become [`MISSING_FIELD`]; arrays are joined with
/// `", "`; other scalars are stringified.
fn lenient_text<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    use serde_json::Value;

    fn scalar(value: &Value) -> String {
        match value {
            Value::String(s) => s.trim().to_string(),
            Value::Null => String::new(),
            other => other.to_string(),
        }
    }

    let value = Value::deserialize(deserializer)?;
    let text = match &value {
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => scalar(other),
    };

    Ok(if text.is_empty() { missing_field() } else { text })
}

// ---------------------------------------------------------------------------
// RowResult
// ---------------------------------------------------------------------------

/// Flat per-row record handed to the caller. Keys are stable column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowResult {
    #[serde(rename = "Brick ID")]
    pub brick_id: String,
    #[serde(rename = "Brick Name")]
    pub brick_name: String,
    #[serde(rename = "Prerequisites")]
    pub prerequisites: String,
    #[serde(rename = "Description")]
    pub description: String,
}

impl RowResult {
    pub const NO_MATCH_ID: &'static str = "No Match";
    pub const ERROR_ID: &'static str = "ERROR";

    /// Record returned when the model found no Brick for the operation.
    pub fn no_match() -> Self {
        Self {
            brick_id: Self::NO_MATCH_ID.into(),
            brick_name: MISSING_FIELD.into(),
            prerequisites: MISSING_FIELD.into(),
            description: "No relevant brick found.".into(),
        }
    }

    /// Record returned when processing the row failed.
    pub fn error(reason: impl Into<String>) -> Self {
        Self {
            brick_id: Self::ERROR_ID.into(),
            brick_name: "System Error".into(),
            prerequisites: MISSING_FIELD.into(),
            description: reason.into(),
        }
    }

    pub fn status(&self) -> RowStatus {
        match self.brick_id.as_str() {
            Self::NO_MATCH_ID => RowStatus::NoMatch,
            Self::ERROR_ID => RowStatus::Error,
            _ => RowStatus::Matched,
        }
    }
}

/// Outcome class of a row, used for batch summaries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowStatus {
    Matched,
    NoMatch,
    Error,
}
