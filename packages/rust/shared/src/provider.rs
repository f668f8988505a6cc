//! Seams to the two external collaborators: retrieval indices and the language model.

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{PromptMessages, RetrievedPassage};

/// A retrieval index mapping a text query to ranked passages.
///
/// Implementations report failures as [`crate::BrickMapperError::Retrieval`].
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return passages for `query`, best match first.
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>>;
}

/// A chat model that answers a (system, user) prompt with raw text.
///
/// Implementations report failures as [`crate::BrickMapperError::Generation`].
/// The returned text is untrusted and may not follow the requested format.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, messages: &PromptMessages) -> Result<String>;
}
