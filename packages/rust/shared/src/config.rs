//! Application configuration for BrickMapper.
//!
//! User config lives at `~/.brickmapper/brickmapper.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{BrickMapperError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "brickmapper.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".brickmapper";

// ---------------------------------------------------------------------------
// Config structs (matching brickmapper.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// OpenRouter settings.
    #[serde(default)]
    pub openrouter: OpenRouterConfig,

    /// Retrieval index endpoints.
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Wall-clock budget for one row, retrieval and generation included.
    #[serde(default = "default_row_timeout")]
    pub row_timeout_secs: u64,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            row_timeout_secs: default_row_timeout(),
        }
    }
}

fn default_row_timeout() -> u64 {
    120
}

/// `[openrouter]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenRouterConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Model used for extraction.
    #[serde(default = "default_model")]
    pub default_model: String,

    /// OpenAI-compatible API root.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Sampling temperature. Extraction wants deterministic output.
    #[serde(default)]
    pub temperature: f32,

    /// HTTP timeout for a single completion request.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            default_model: default_model(),
            base_url: default_base_url(),
            temperature: 0.0,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_model() -> String {
    "google/gemini-2.5-flash".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_request_timeout() -> u64 {
    60
}

/// `[retrieval]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Query endpoint of the identifier-keyed index.
    #[serde(default = "default_specific_url")]
    pub specific_url: String,

    /// Query endpoint of the general-purpose index.
    #[serde(default = "default_general_url")]
    pub general_url: String,

    /// Number of passages requested per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// HTTP timeout for a single retrieval request.
    #[serde(default = "default_retrieval_timeout")]
    pub timeout_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            specific_url: default_specific_url(),
            general_url: default_general_url(),
            top_k: default_top_k(),
            timeout_secs: default_retrieval_timeout(),
        }
    }
}

fn default_specific_url() -> String {
    "http://127.0.0.1:8088/indices/specific/query".into()
}
fn default_general_url() -> String {
    "http://127.0.0.1:8088/indices/general/query".into()
}
fn default_top_k() -> usize {
    5
}
fn default_retrieval_timeout() -> u64 {
    30
}

// ---------------------------------------------------------------------------
// Pipeline config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime row-processing configuration, merged from the config file and CLI flags.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Per-row timeout. A row exceeding it becomes an ERROR record.
    pub row_timeout: Duration,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            row_timeout: Duration::from_secs(config.defaults.row_timeout_secs),
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.brickmapper/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| BrickMapperError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.brickmapper/brickmapper.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| BrickMapperError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        BrickMapperError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| BrickMapperError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| BrickMapperError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| BrickMapperError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Check that the OpenRouter API key env var is set and non-empty.
/// Returns the key on success.
pub fn validate_api_key(config: &AppConfig) -> Result<String> {
    let var_name = &config.openrouter.api_key_env;
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(BrickMapperError::config(format!(
            "OpenRouter API key not found. Set the {var_name} environment variable.\n\
             Get a key at https://openrouter.ai/keys"
        ))),
    }
}

/// Parse an endpoint string from config into a URL.
pub fn parse_endpoint(raw: &str) -> Result<url::Url> {
    url::Url::parse(raw)
        .map_err(|e| BrickMapperError::validation(format!("invalid endpoint URL '{raw}': {e}")))
}
