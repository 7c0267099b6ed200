//! # Seamshift
//!
//! A G-code post-processor for PrusaSlicer-family output that moves the
//! flow discontinuity of each external perimeter loop away from the loop
//! start, hiding the seam.
//!
//! ## Architecture
//!
//! Seamshift is organized as a workspace with multiple crates:
//!
//! 1. **seamshift-core** - Pose type, number formatting, errors
//! 2. **seamshift-gcode** - Line parsing, position tracking, line I/O
//! 3. **seamshift-settings** - Tunable thresholds and labels, TOML/JSON persistence
//! 4. **seamshift-seam** - Loop detection, seam rewriting, streaming driver
//! 5. **seamshift** - Command line binary that rewrites a file in place

pub use seamshift_core::{ConfigError, Error, GcodeError, Pose, Result, SeamError};
pub use seamshift_seam::{process_reader, process_str, rewrite_file, RunSummary};
pub use seamshift_settings::SeamSettings;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build date (set at compile time)
pub const BUILD_DATE: &str = env!("BUILD_DATE");

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Initialize logging
///
/// Logs go to stderr so they never mix with G-code. The level defaults to
/// `warn` and can be overridden with `RUST_LOG`; `verbose` raises the
/// default to `info`.
pub fn init_logging(format: LogFormat, verbose: bool) -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let default_level = if verbose { "info" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = match format {
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .with_level(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init(),
    };

    result.map_err(|e| anyhow::anyhow!("failed to initialize logging: {}", e))
}
