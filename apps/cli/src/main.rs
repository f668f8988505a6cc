//! BrickMapper CLI: map operation descriptions to Brick IDs.
//!
//! Reads operations, runs the retrieval-augmented extraction pipeline on each
//! one and writes the mapped rows as JSON.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
