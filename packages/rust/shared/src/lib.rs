//! Shared types, error model, collaborator traits, and configuration for BrickMapper.
//!
//! This crate is the foundation depended on by all other BrickMapper crates.
//! It provides:
//! - [`BrickMapperError`]: the unified error type
//! - Domain types ([`RetrievedPassage`], [`PromptMessages`], [`Brick`], [`RowResult`])
//! - Collaborator seams ([`Retriever`], [`LanguageModel`])
//! - Configuration ([`AppConfig`], [`PipelineConfig`], config loading)

pub mod config;
pub mod error;
pub mod provider;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OpenRouterConfig, PipelineConfig, RetrievalConfig, config_dir,
    config_file_path, init_config, load_config, load_config_from, parse_endpoint, validate_api_key,
};
pub use error::{BrickMapperError, Result};
pub use provider::{LanguageModel, Retriever};
pub use types::{
    Brick, MISSING_FIELD, ParsedResponse, PassageMetadata, PromptMessages, RetrievedPassage,
    RowResult, RowStatus,
};
