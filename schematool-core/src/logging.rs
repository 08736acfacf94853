//! Logging setup for the launcher.
//!
//! Log output goes to stderr so the stdout target carries nothing but DDL.
//! The runner itself never installs a subscriber; it logs through whatever
//! dispatcher is current, or the one injected with
//! [`SchemaToolRunner::with_logger`](crate::runner::SchemaToolRunner::with_logger).

use crate::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

/// Maps verbosity flags to a maximum log level.
///
/// `quiet` wins over any verbosity; 0 is INFO, 1 is DEBUG, 2 and above TRACE.
pub fn level_for(verbose: u8, quiet: bool) -> tracing::Level {
    match (quiet, verbose) {
        (true, _) => tracing::Level::ERROR,
        (false, 0) => tracing::Level::INFO,
        (false, 1) => tracing::Level::DEBUG,
        (false, _) => tracing::Level::TRACE,
    }
}

/// Initializes structured logging based on verbosity level.
///
/// A non-empty `RUST_LOG` replaces the level derived from the flags.
///
/// # Example
/// ```rust,no_run
/// use schematool_core::logging::init_logging;
///
/// // Initialize at DEBUG level
/// init_logging(1, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level_for(verbose, quiet)).into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init()
        .map_err(|e| {
            crate::error::SchemaToolError::config_invalid(format!(
                "Failed to initialize logging: {}",
                e
            ))
        })?;

    Ok(())
}
