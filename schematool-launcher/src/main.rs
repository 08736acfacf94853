//! Properties-driven schema export/update launcher.
//!
//! Reads the properties file named by `--prop-file` or `PROP_FILE` and runs
//! one schema action against the configured database. Entity descriptors
//! come from the JSON catalogs listed in `schematool.entity.catalog`.
//!
//! A missing properties path is logged and exits successfully; every other
//! failure exits non-zero with its full cause chain.

use clap::Parser;
use schematool_core::logging::init_logging;
use schematool_core::{EntityRegistry, RunOutcome};
use schematool_launcher::{Cli, run};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.global.verbose, cli.global.quiet)?;

    match run(&cli, EntityRegistry::new()).await? {
        RunOutcome::NotConfigured => tracing::debug!("Nothing to do without a properties file"),
        outcome => tracing::debug!("Finished: {:?}", outcome),
    }

    Ok(())
}
