//! In-process stand-ins for the retrieval indices and the model.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use brickmapper_shared::{
    BrickMapperError, LanguageModel, PipelineConfig, PromptMessages, Result, RetrievedPassage,
    Retriever,
};

use crate::processor::RowProcessor;
use crate::router::IndexSet;

pub(crate) fn processor_with(
    specific: Arc<dyn Retriever>,
    general: Arc<dyn Retriever>,
    model: Arc<dyn LanguageModel>,
) -> RowProcessor {
    RowProcessor::new(
        IndexSet::new(specific, general),
        model,
        PipelineConfig::default(),
    )
}

/// Always returns the same passages.
pub(crate) struct StaticRetriever(Vec<RetrievedPassage>);

impl StaticRetriever {
    pub(crate) fn new(passages: Vec<RetrievedPassage>) -> Self {
        Self(passages)
    }

    pub(crate) fn empty() -> Self {
        Self(Vec::new())
    }
}

#[async_trait]
impl Retriever for StaticRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedPassage>> {
        Ok(self.0.clone())
    }
}

/// Remembers every query it was asked.
#[derive(Default)]
pub(crate) struct RecordingRetriever(Mutex<Vec<String>>);

impl RecordingRetriever {
    pub(crate) fn queries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for RecordingRetriever {
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        self.0.lock().unwrap().push(query.to_string());
        Ok(Vec::new())
    }
}

pub(crate) struct FailingRetriever;

#[async_trait]
impl Retriever for FailingRetriever {
    async fn retrieve(&self, _query: &str) -> Result<Vec<RetrievedPassage>> {
        Err(BrickMapperError::Retrieval("index unavailable".into()))
    }
}

/// Replies with a fixed text (or a fixed error) and keeps the last prompt.
pub(crate) struct ScriptedModel {
    reply: std::result::Result<String, String>,
    last: Mutex<Option<PromptMessages>>,
}

impl ScriptedModel {
    pub(crate) fn new(reply: &str) -> Self {
        Self {
            reply: Ok(reply.to_string()),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self {
            reply: Err(reason.to_string()),
            last: Mutex::new(None),
        }
    }

    pub(crate) fn last_prompt(&self) -> Option<PromptMessages> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl LanguageModel for ScriptedModel {
    async fn complete(&self, messages: &PromptMessages) -> Result<String> {
        *self.last.lock().unwrap() = Some(messages.clone());
        self.reply.clone().map_err(BrickMapperError::Generation)
    }
}

/// Answers only after the given delay.
pub(crate) struct SlowModel(pub(crate) Duration);

#[async_trait]
impl LanguageModel for SlowModel {
    async fn complete(&self, _messages: &PromptMessages) -> Result<String> {
        tokio::time::sleep(self.0).await;
        Ok(r#"{"bricks": []}"#.to_string())
    }
}

pub(crate) struct PanickingModel;

#[async_trait]
impl LanguageModel for PanickingModel {
    async fn complete(&self, messages: &PromptMessages) -> Result<String> {
        if messages.user.contains("Launch") {
            panic!("model adapter bug");
        }
        Ok(r#"{"bricks": []}"#.to_string())
    }
}
