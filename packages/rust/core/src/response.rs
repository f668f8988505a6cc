//! Decoding of raw model text into a [`ParsedResponse`].
//!
//! The model is asked for bare JSON but often wraps it in a Markdown code
//! fence, and sometimes returns something that is not JSON at all. Fences are
//! stripped; anything that still does not decode is reported as
//! [`ParseOutcome::Malformed`] and collapses to "no bricks" for the caller.

use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, warn};

use brickmapper_shared::{Brick, ParsedResponse};

/// Result of decoding model output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// The text decoded. `bricks` may legitimately be empty.
    Parsed(ParsedResponse),
    /// The text could not be decoded into the contract shape.
    Malformed { raw: String, reason: String },
}

impl ParseOutcome {
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed { .. })
    }

    /// Collapse to a response; malformed output becomes an empty Brick list.
    pub fn into_response(self) -> ParsedResponse {
        match self {
            Self::Parsed(response) => response,
            Self::Malformed { .. } => ParsedResponse::default(),
        }
    }
}

/// Remove every code-fence marker (```` ``` ```` or ```` ```json ````) and trim.
fn strip_code_fences(text: &str) -> String {
    static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)```(?:json)?").expect("valid regex")
    });

    FENCE_RE.replace_all(text, "").trim().to_string()
}

/// Decode raw model text, keeping malformed output distinguishable.
///
/// Decoded JSON without a `bricks` key (or with `"bricks": null`) is treated
/// as a successful, empty answer.
pub fn parse_response(raw: &str) -> ParseOutcome {
    let cleaned = strip_code_fences(raw);

    let value: Value = match serde_json::from_str(&cleaned) {
        Ok(value) => value,
        Err(e) => return malformed(raw, format!("invalid JSON: {e}")),
    };

    let bricks = match value.get("bricks") {
        None | Some(Value::Null) => {
            warn!("model output has no `bricks` key, treating as empty");
            return ParseOutcome::Parsed(ParsedResponse::default());
        }
        Some(bricks) => bricks,
    };

    match Vec::<Brick>::deserialize(bricks) {
        Ok(bricks) => ParseOutcome::Parsed(ParsedResponse { bricks }),
        Err(e) => malformed(raw, format!("unexpected `bricks` shape: {e}")),
    }
}

/// Decode raw model text; never fails.
pub fn parse(raw: &str) -> ParsedResponse {
    parse_response(raw).into_response()
}

fn malformed(raw: &str, reason: String) -> ParseOutcome {
    error!(%reason, raw_output = %raw, "failed to decode model output");
    ParseOutcome::Malformed {
        raw: raw.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fenced_json_is_decoded() {
        let raw = "```json\n{\"bricks\": [{\"id\":\"KW-1\",\"name\":\"Launch Catia\",\"prerequisites\":\"-\"}]}\n```";
        let outcome = parse_response(raw);
        assert_eq!(
            outcome,
            ParseOutcome::Parsed(ParsedResponse {
                bricks: vec![Brick::new("KW-1", "Launch Catia", "-")],
            })
        );
    }

    #[test]
    fn bare_fence_and_surrounding_whitespace() {
        let raw = "\n```\n{\"bricks\": []}\n```\n";
        assert_eq!(parse_response(raw), ParseOutcome::Parsed(ParsedResponse::default()));
    }

    #[test]
    fn fixture_response_keeps_order_and_content() {
        let raw = std::fs::read_to_string("../../../fixtures/llm/fenced-multi-brick.txt")
            .expect("read response fixture");
        let parsed = parse(&raw);
        let ids: Vec<_> = parsed.bricks.iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["KW-1", "S-5", "G-3"]);
        assert_eq!(parsed.bricks[1].prerequisites, "KW-1 (Launch Catia)");
    }

    #[test]
    fn truncated_json_is_malformed() {
        let raw = r#"{"bricks": [{"id": "KW-1", "name": "Lau"#;
        let outcome = parse_response(raw);
        assert!(outcome.is_malformed());
        assert_eq!(outcome.into_response(), ParsedResponse::default());
    }

    #[test]
    fn prose_is_malformed() {
        let outcome = parse_response("I could not find any matching brick.");
        match outcome {
            ParseOutcome::Malformed { raw, reason } => {
                assert_eq!(raw, "I could not find any matching brick.");
                assert!(reason.contains("invalid JSON"));
            }
            ParseOutcome::Parsed(_) => panic!("expected Malformed"),
        }
    }

    #[test]
    fn missing_bricks_key_is_empty_not_malformed() {
        let outcome = parse_response(r#"{"result": "nothing"}"#);
        assert_eq!(outcome, ParseOutcome::Parsed(ParsedResponse::default()));

        let outcome = parse_response(r#"{"bricks": null}"#);
        assert_eq!(outcome, ParseOutcome::Parsed(ParsedResponse::default()));
    }

    #[test]
    fn non_object_json_is_empty() {
        assert_eq!(parse(r#"["KW-1"]"#), ParsedResponse::default());
        assert!(!parse_response("42").is_malformed());
    }

    #[test]
    fn wrong_bricks_shape_is_malformed() {
        assert!(parse_response(r#"{"bricks": "KW-1"}"#).is_malformed());
        assert!(parse_response(r#"{"bricks": ["KW-1"]}"#).is_malformed());
    }

    #[test]
    fn parse_never_panics_on_empty_input() {
        assert_eq!(parse(""), ParsedResponse::default());
    }
}
