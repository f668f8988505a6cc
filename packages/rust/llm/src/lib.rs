//! OpenRouter chat-completions client used as the extraction model.
//!
//! Sends the (system, user) prompt pair to the OpenAI-compatible
//! `/chat/completions` endpoint and returns the first choice's text as-is.
//! The text is not interpreted here; the response parser deals with it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use brickmapper_shared::{
    AppConfig, BrickMapperError, LanguageModel, PromptMessages, Result, parse_endpoint,
    validate_api_key,
};

/// User-Agent string for completion requests.
const USER_AGENT: &str = concat!("BrickMapper/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Settings for [`OpenRouterModel`].
#[derive(Debug, Clone)]
pub struct ModelOptions {
    /// API root, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: Url,
    /// Model identifier.
    pub model: String,
    /// Bearer token.
    pub api_key: String,
    pub temperature: f32,
    pub timeout: Duration,
}

impl ModelOptions {
    /// Resolve options from the `[openrouter]` section, reading the key from
    /// the environment variable it names.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let section = &config.openrouter;
        Ok(Self {
            base_url: parse_endpoint(&section.base_url)?,
            model: section.default_model.clone(),
            api_key: validate_api_key(config)?,
            temperature: section.temperature,
            timeout: Duration::from_secs(section.request_timeout_secs),
        })
    }
}

/// Chat model reached over the OpenRouter API.
#[derive(Debug, Clone)]
pub struct OpenRouterModel {
    client: Client,
    completions_url: String,
    model: String,
    api_key: String,
    temperature: f32,
}

impl OpenRouterModel {
    pub fn new(opts: ModelOptions) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| {
                BrickMapperError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        let completions_url = format!(
            "{}/chat/completions",
            opts.base_url.as_str().trim_end_matches('/')
        );

        Ok(Self {
            client,
            completions_url,
            model: opts.model,
            api_key: opts.api_key,
            temperature: opts.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for OpenRouterModel {
    #[instrument(skip_all, fields(model = %self.model))]
    async fn complete(&self, messages: &PromptMessages) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: messages.system,
                },
                ChatMessage {
                    role: "user",
                    content: &messages.user,
                },
            ],
            temperature: self.temperature,
        };

        let response = self
            .client
            .post(&self.completions_url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| BrickMapperError::Generation(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(BrickMapperError::Generation(format!("HTTP {status}: {snippet}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| BrickMapperError::Generation(format!("invalid response body: {e}")))?;

        if let Some(usage) = &body.usage {
            debug!(
                tokens_in = usage.prompt_tokens,
                tokens_out = usage.completion_tokens,
                "completion usage"
            );
        }

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| BrickMapperError::Generation("response contained no choices".into()))
    }
}
