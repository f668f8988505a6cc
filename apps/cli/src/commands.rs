//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use brickmapper_core::{
    BatchProgress, BatchSummary, IndexSet, OperationRow, RowProcessor, run_batch,
};
use brickmapper_llm::{ModelOptions, OpenRouterModel};
use brickmapper_retrieval::HttpRetriever;
use brickmapper_shared::{AppConfig, PipelineConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// BrickMapper: map operation descriptions to the Bricks that implement them.
#[derive(Parser)]
#[command(
    name = "brickmapper",
    version,
    about = "Map free-text operation descriptions to Brick IDs using retrieval-augmented extraction.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.brickmapper/brickmapper.toml.
    #[arg(long, global = true, env = "BRICKMAPPER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Overrides shared by every command that runs the pipeline.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct RunOverrides {
    /// Model ID (overrides `openrouter.default_model`).
    #[arg(long)]
    pub model: Option<String>,

    /// Per-row timeout in seconds (overrides `defaults.row_timeout_secs`).
    #[arg(long)]
    pub timeout: Option<u64>,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Map every operation in a file and write the mapped rows as JSON.
    Map {
        /// Operations file: a JSON array of {"Operation ID", "Operation description"}
        /// objects, or plain text with one description per line.
        #[arg(short, long)]
        input: PathBuf,

        /// Output file (defaults to stdout).
        #[arg(short, long)]
        out: Option<PathBuf>,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Map a single operation description and print the row as JSON.
    Query {
        /// The operation description.
        description: String,

        #[command(flatten)]
        overrides: RunOverrides,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags. Logs go to stderr; stdout carries results.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "brickmapper=info",
        1 => "brickmapper=debug",
        _ => "brickmapper=trace",
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Map {
            input,
            out,
            overrides,
        } => cmd_map(config_path, &input, out.as_deref(), &overrides).await,
        Command::Query {
            description,
            overrides,
        } => cmd_query(config_path, &description, &overrides).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_map(
    config_path: Option<&Path>,
    input: &Path,
    out: Option<&Path>,
    overrides: &RunOverrides,
) -> Result<()> {
    let config = resolve_config(config_path, overrides)?;

    let content = std::fs::read_to_string(input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))?;
    let rows = parse_operations(&content)
        .wrap_err_with(|| format!("failed to parse {}", input.display()))?;

    info!(input = %input.display(), rows = rows.len(), "mapping operations");

    let processor = build_processor(&config)?;
    let reporter = CliProgress::new(rows.len());
    let mapped = run_batch(&processor, &rows, &reporter).await;

    let json = serde_json::to_string_pretty(&mapped)?;
    match out {
        Some(path) => {
            std::fs::write(path, json)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            println!("Mapped rows written to: {}", path.display());
        }
        None => println!("{json}"),
    }

    Ok(())
}

async fn cmd_query(
    config_path: Option<&Path>,
    description: &str,
    overrides: &RunOverrides,
) -> Result<()> {
    if description.trim().is_empty() {
        return Err(eyre!("operation description must not be empty"));
    }

    let config = resolve_config(config_path, overrides)?;
    let processor = build_processor(&config)?;

    let row = processor.process(description).await;
    println!("{}", serde_json::to_string_pretty(&row)?);

    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path, &RunOverrides::default())?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Wiring
// ---------------------------------------------------------------------------

/// Load the config file (or defaults) and apply CLI overrides.
fn resolve_config(path: Option<&Path>, overrides: &RunOverrides) -> Result<AppConfig> {
    let mut config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(model) = &overrides.model {
        config.openrouter.default_model = model.clone();
    }
    if let Some(secs) = overrides.timeout {
        config.defaults.row_timeout_secs = secs;
    }

    Ok(config)
}

/// Connect both retrieval indices and the model, once, before any row runs.
fn build_processor(config: &AppConfig) -> Result<RowProcessor> {
    let (specific, general) = HttpRetriever::pair_from_config(&config.retrieval)?;
    let model = OpenRouterModel::new(ModelOptions::from_config(config)?)?;

    info!(
        model = model.model(),
        specific = %config.retrieval.specific_url,
        general = %config.retrieval.general_url,
        "pipeline ready"
    );

    Ok(RowProcessor::new(
        IndexSet::new(Arc::new(specific), Arc::new(general)),
        Arc::new(model),
        PipelineConfig::from(config),
    ))
}

/// Read operations from a JSON array, or from plain text (one description per line).
fn parse_operations(content: &str) -> Result<Vec<OperationRow>> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).wrap_err("invalid operations JSON");
    }

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .enumerate()
        .map(|(i, line)| OperationRow {
            operation_id: format!("OP-{}", i + 1),
            description: line.to_string(),
        })
        .collect())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif bar.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new(total: usize) -> Self {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap()
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { bar }
    }
}

impl BatchProgress for CliProgress {
    fn row_started(&self, current: usize, total: usize, description: &str) {
        let preview: String = description.chars().take(60).collect();
        self.bar.set_length(total as u64);
        self.bar.set_position(current.saturating_sub(1) as u64);
        self.bar.set_message(format!("Processing: {preview}"));
    }

    fn done(&self, summary: &BatchSummary) {
        self.bar.finish_and_clear();
        eprintln!(
            "  Processed {} rows: {} matched, {} no match, {} errors",
            summary.total(),
            summary.matched,
            summary.no_match,
            summary.errors
        );
    }
}
