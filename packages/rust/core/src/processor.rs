//! Per-row orchestration: route → retrieve → format → prompt → model → parse → sanitize.
//!
//! [`RowProcessor::process_row`] is total. Every fault inside a row, including
//! a timeout or a panic in a collaborator, comes back as an ERROR record so
//! the rest of the batch keeps going.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tracing::{debug, error, info, instrument};

use brickmapper_shared::{
    Brick, BrickMapperError, LanguageModel, ParsedResponse, PipelineConfig, Result, RowResult,
};

use crate::context::format_context;
use crate::prompt::build_prompt;
use crate::response::parse;
use crate::router::IndexSet;
use crate::sanitize::sanitize_prerequisites;

/// Runs the extraction pipeline for one operation description at a time.
pub struct RowProcessor {
    indices: IndexSet,
    model: Arc<dyn LanguageModel>,
    config: PipelineConfig,
}

impl RowProcessor {
    pub fn new(indices: IndexSet, model: Arc<dyn LanguageModel>, config: PipelineConfig) -> Self {
        Self {
            indices,
            model,
            config,
        }
    }

    /// Map one description to a [`RowResult`]. Never fails.
    pub async fn process(&self, description: &str) -> RowResult {
        self.process_row(None, description).await
    }

    /// Like [`process`](Self::process), with the row's position for log context.
    #[instrument(skip_all, fields(row = index))]
    pub async fn process_row(&self, index: Option<usize>, description: &str) -> RowResult {
        let guarded = AssertUnwindSafe(self.extract(description)).catch_unwind();

        let outcome = match tokio::time::timeout(self.config.row_timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(BrickMapperError::Unexpected(panic_message(panic.as_ref()))),
            Err(_) => Err(BrickMapperError::Timeout {
                secs: self.config.row_timeout.as_secs(),
            }),
        };

        match outcome {
            Ok(response) => {
                info!(bricks = response.bricks.len(), "row mapped");
                shape_row(&response)
            }
            Err(e) => {
                error!(row = ?index, %description, error = %e, "error processing row");
                RowResult::error(e.to_string())
            }
        }
    }

    /// The fallible part of a row: everything up to and including parsing.
    pub async fn extract(&self, description: &str) -> Result<ParsedResponse> {
        let (kind, retriever) = self.indices.select(description);
        debug!(index = %kind, "routed query");

        let passages = retriever.retrieve(description).await?;
        debug!(passages = passages.len(), "retrieved context");

        let context = format_context(&passages);
        let prompt = build_prompt(&context, description);
        let raw = self.model.complete(&prompt).await?;

        Ok(parse(&raw))
    }
}

/// Flatten a parsed response into the tabular row shape.
///
/// Each column holds one line per Brick, in the order the model listed them.
/// Prerequisites are re-derived from the raw field.
pub fn shape_row(response: &ParsedResponse) -> RowResult {
    if response.bricks.is_empty() {
        return RowResult::no_match();
    }

    let bricks = &response.bricks;
    RowResult {
        brick_id: join_lines(bricks, |b| b.id.clone()),
        brick_name: join_lines(bricks, |b| b.name.clone()),
        prerequisites: join_lines(bricks, |b| sanitize_prerequisites(&b.prerequisites)),
        description: join_lines(bricks, |b| {
            format!("[{}]: Mapped based on operation description.", b.id)
        }),
    }
}

fn join_lines(bricks: &[Brick], field: impl Fn(&Brick) -> String) -> String {
    bricks.iter().map(field).collect::<Vec<_>>().join("\n")
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic with non-string payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use brickmapper_shared::RowStatus;

    use crate::testing::{
        FailingRetriever, PanickingModel, RecordingRetriever, ScriptedModel, SlowModel,
        StaticRetriever, processor_with,
    };

    const FENCED_ONE: &str = "```json {\"bricks\": [{\"id\":\"KW-1\",\"name\":\"Launch Catia\",\"prerequisites\":\"-\"}]} ```";

    #[tokio::test]
    async fn fenced_single_brick_end_to_end() {
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(ScriptedModel::new(FENCED_ONE)),
        );

        let row = processor.process("Launch Catia").await;
        assert_eq!(row.brick_id, "KW-1");
        assert_eq!(row.brick_name, "Launch Catia");
        assert_eq!(row.prerequisites, "-");
        assert_eq!(row.description, "[KW-1]: Mapped based on operation description.");
        assert_eq!(row.status(), RowStatus::Matched);
    }

    #[tokio::test]
    async fn multiple_bricks_are_newline_joined_and_sanitized() {
        let raw = r#"{"bricks": [
            {"id": "KW-1", "name": "Launch Catia", "prerequisites": "-"},
            {"id": "S-5", "name": "Check Responsive", "prerequisites": "KW-1 (Launch Catia) and S-2"}
        ]}"#;
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(ScriptedModel::new(raw)),
        );

        let row = processor.process("Launch Catia and check it responds").await;
        assert_eq!(row.brick_id, "KW-1\nS-5");
        assert_eq!(row.brick_name, "Launch Catia\nCheck Responsive");
        assert_eq!(row.prerequisites, "-\nKW-1, S-2");
        assert_eq!(
            row.description,
            "[KW-1]: Mapped based on operation description.\n\
             [S-5]: Mapped based on operation description."
        );
    }

    #[tokio::test]
    async fn zero_bricks_is_no_match() {
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(ScriptedModel::new(r#"{"bricks": []}"#)),
        );
        let row = processor.process("Water the plants").await;
        assert_eq!(row, RowResult::no_match());
        assert_eq!(row.brick_id, "No Match");
    }

    #[tokio::test]
    async fn malformed_output_is_no_match_not_error() {
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(ScriptedModel::new("Sorry, I can't help with that.")),
        );
        let row = processor.process("Launch Catia").await;
        assert_eq!(row.status(), RowStatus::NoMatch);
    }

    #[tokio::test]
    async fn retrieval_failure_is_error_record() {
        let processor = processor_with(
            Arc::new(FailingRetriever),
            Arc::new(FailingRetriever),
            Arc::new(ScriptedModel::new(FENCED_ONE)),
        );
        let row = processor.process("Launch Catia").await;
        assert_eq!(row.brick_id, "ERROR");
        assert_eq!(row.brick_name, "System Error");
        assert_eq!(row.prerequisites, "-");
        assert!(row.description.contains("index unavailable"));
    }

    #[tokio::test]
    async fn generation_failure_is_error_record() {
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(ScriptedModel::failing("quota exceeded")),
        );
        let row = processor.process("Launch Catia").await;
        assert_eq!(row.status(), RowStatus::Error);
        assert_eq!(row.description, "generation error: quota exceeded");
    }

    #[tokio::test]
    async fn slow_model_times_out_into_error_record() {
        let processor = RowProcessor::new(
            IndexSet::new(
                Arc::new(StaticRetriever::empty()),
                Arc::new(StaticRetriever::empty()),
            ),
            Arc::new(SlowModel(Duration::from_secs(5))),
            PipelineConfig {
                row_timeout: Duration::from_millis(50),
            },
        );
        let row = processor.process("Launch Catia").await;
        assert_eq!(row.status(), RowStatus::Error);
        assert!(row.description.contains("timed out"));
    }

    #[tokio::test]
    async fn panicking_model_is_contained() {
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            Arc::new(PanickingModel),
        );
        let row = processor.process_row(Some(3), "Launch Catia").await;
        assert_eq!(row.status(), RowStatus::Error);
        assert!(row.description.contains("panic"));
    }

    #[tokio::test]
    async fn query_with_identifier_hits_specific_index() {
        let specific = Arc::new(RecordingRetriever::default());
        let general = Arc::new(RecordingRetriever::default());
        let model = Arc::new(ScriptedModel::new(FENCED_ONE));
        let processor = processor_with(specific.clone(), general.clone(), model.clone());

        processor.process("Run KW-1 then save").await;
        processor.process("Open the drawing").await;

        assert_eq!(specific.queries(), vec!["Run KW-1 then save"]);
        assert_eq!(general.queries(), vec!["Open the drawing"]);
    }

    #[tokio::test]
    async fn retrieved_context_reaches_the_model() {
        let retriever = Arc::new(StaticRetriever::new(vec![
            brickmapper_shared::RetrievedPassage::new(
                "Starts CATIA\nV5.",
                Some("purpose"),
                Some("KW-1"),
            ),
        ]));
        let model = Arc::new(ScriptedModel::new(FENCED_ONE));
        let processor = processor_with(retriever.clone(), retriever, model.clone());

        processor.process("Launch Catia").await;

        let prompt = model.last_prompt().expect("model was called");
        assert!(prompt.user.contains("--- SOURCE 1: Brick KW-1 [PURPOSE] ---\nStarts CATIA V5."));
        assert!(prompt.user.ends_with("**Target Operation:**\nLaunch Catia"));
    }

    #[tokio::test]
    async fn empty_retrieval_sends_sentinel_context() {
        let model = Arc::new(ScriptedModel::new(FENCED_ONE));
        let processor = processor_with(
            Arc::new(StaticRetriever::empty()),
            Arc::new(StaticRetriever::empty()),
            model.clone(),
        );
        processor.process("Launch Catia").await;
        let prompt = model.last_prompt().unwrap();
        assert!(prompt.user.contains("No relevant context found."));
    }

    #[test]
    fn shape_row_keeps_model_ids_verbatim() {
        let response = ParsedResponse {
            bricks: vec![Brick::new("kw-1", "Launch", "kw-2 please")],
        };
        let row = shape_row(&response);
        assert_eq!(row.brick_id, "kw-1");
        assert_eq!(row.prerequisites, "KW-2");
    }
}
