use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use seamshift::{init_logging, rewrite_file, LogFormat, SeamSettings};

/// Rewrite external perimeter loops in a G-code file so their seam is less visible
#[derive(Parser, Debug)]
#[command(name = "seamshift")]
#[command(version = LONG_VERSION, about)]
struct Cli {
    /// G-code file to rewrite in place
    path: PathBuf,

    /// Settings file (.toml or .json)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Log progress at info level
    #[arg(long, short)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (built ",
    env!("BUILD_DATE"),
    ")"
);

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let format = if cli.json_logs {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    init_logging(format, cli.verbose)?;

    let settings = match &cli.config {
        Some(path) => SeamSettings::load_from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => SeamSettings::default(),
    };

    let summary = rewrite_file(&cli.path, &settings)
        .with_context(|| format!("failed to rewrite {}", cli.path.display()))?;

    tracing::info!(path = %cli.path.display(), %summary, "done");
    Ok(())
}
