//! HTTP client for the Brick retrieval indices.
//!
//! Each index (`specific`, `general`) is served behind its own query
//! endpoint. A query is a `POST` of `{"query": ..., "top_k": ...}`; the answer
//! is either `{"passages": [...]}` or a bare JSON array of passages, best
//! match first. Building and maintaining the indices happens elsewhere.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};
use url::Url;

use brickmapper_shared::{
    BrickMapperError, RetrievalConfig, Result, RetrievedPassage, Retriever, parse_endpoint,
};

/// User-Agent string for retrieval requests.
const USER_AGENT: &str = concat!("BrickMapper/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QueryResponse {
    Wrapped { passages: Vec<RetrievedPassage> },
    Bare(Vec<RetrievedPassage>),
}

impl QueryResponse {
    fn into_passages(self) -> Vec<RetrievedPassage> {
        match self {
            Self::Wrapped { passages } | Self::Bare(passages) => passages,
        }
    }
}

/// One remote retrieval index.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    name: String,
    endpoint: Url,
    top_k: usize,
}

impl HttpRetriever {
    /// Create a client for the index at `endpoint`.
    pub fn new(
        name: impl Into<String>,
        endpoint: Url,
        top_k: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| {
                BrickMapperError::Network(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            name: name.into(),
            endpoint,
            top_k,
        })
    }

    /// Build the `(specific, general)` pair from the `[retrieval]` config section.
    pub fn pair_from_config(config: &RetrievalConfig) -> Result<(Self, Self)> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let specific = Self::new(
            "specific",
            parse_endpoint(&config.specific_url)?,
            config.top_k,
            timeout,
        )?;
        let general = Self::new(
            "general",
            parse_endpoint(&config.general_url)?,
            config.top_k,
            timeout,
        )?;
        Ok((specific, general))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn fault(&self, detail: impl std::fmt::Display) -> BrickMapperError {
        BrickMapperError::Retrieval(format!("{} index ({}): {detail}", self.name, self.endpoint))
    }
}

#[async_trait]
impl Retriever for HttpRetriever {
    #[instrument(skip_all, fields(index = %self.name))]
    async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&QueryRequest {
                query,
                top_k: self.top_k,
            })
            .send()
            .await
            .map_err(|e| self.fault(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fault(format!("HTTP {status}")));
        }

        let body: QueryResponse = response
            .json()
            .await
            .map_err(|e| self.fault(format!("invalid response body: {e}")))?;

        let passages = body.into_passages();
        debug!(count = passages.len(), "passages retrieved");
        Ok(passages)
    }
}
