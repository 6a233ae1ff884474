//! normalize-refs - rewrite a reference list against the disc catalog

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

/// Command-line arguments for normalize-refs
#[derive(Parser, Debug)]
#[command(name = "normalize-refs")]
#[command(about = "Normalize a REFERENCE column against the disc catalog")]
#[command(version)]
struct Args {
    /// Discs table providing the catalog
    #[arg(long, default_value = "data/discs.csv")]
    discs: PathBuf,

    /// CSV with a REFERENCE column
    #[arg(long, default_value = "orig.csv")]
    input: PathBuf,

    /// Output CSV (single REFERENCE column)
    #[arg(long, default_value = "normalized.csv")]
    output: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    let summary = lje_ex::batch::normalize_file(&args.discs, &args.input, &args.output)
        .with_context(|| format!("Failed to normalize {}", args.input.display()))?;

    info!(
        "Normalization complete: {} references, {} without catalog match, written to {}",
        summary.total,
        summary.unmatched,
        args.output.display()
    );
    Ok(())
}
