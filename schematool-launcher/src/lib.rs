//! Library module for schematool-launcher
//!
//! Holds the CLI definition and runner wiring so they can be tested; the
//! binary entry point is in main.rs.

use anyhow::Context;
use clap::{Args, Parser};
use schematool_core::config::keys;
use schematool_core::{EntityRegistry, RunOutcome, SchemaToolRunner};
use std::path::PathBuf;

/// CLI argument structure
#[derive(Debug, Parser)]
#[command(name = "schematool-launcher")]
#[command(about = "Export or update a database schema from a properties file")]
#[command(version)]
#[command(long_about = "
schematool launcher - properties-driven schema export and update

Reads the properties file named by --prop-file or PROP_FILE and runs the
action selected by hibernate.hbm2ddl.auto:

  drop          drop every mapped table
  create-only   create every mapped table
  create        drop, then create
  create-drop   same as create (drop on close is not supported)
  update        add missing tables, columns, indexes and foreign keys

Any other value does nothing.

SUPPORTED DATABASES:
- PostgreSQL (jdbc:postgresql:// or postgres://)
- MySQL / MariaDB (jdbc:mysql:// or mysql://) [if compiled with --features mysql]
- SQLite (jdbc:sqlite: or sqlite:)
- Anything else (e.g. jdbc:h2:) gets generic DDL, for --dry-run or script output only

EXAMPLES:
  PROP_FILE=schema.properties schematool-launcher
  schematool-launcher --prop-file schema.properties --dry-run
")]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Properties file driving the run
    #[arg(long, env = "PROP_FILE", value_name = "FILE")]
    pub prop_file: Option<PathBuf>,

    /// Print the statements instead of touching the database
    #[arg(long, help = "Print generated DDL to stdout instead of executing it")]
    pub dry_run: bool,
}

/// Verbosity flags shared by every invocation
#[derive(Debug, Args)]
pub struct GlobalArgs {
    /// Increase verbosity
    #[arg(
        short,
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv)"
    )]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, help = "Suppress all output except errors")]
    pub quiet: bool,
}

/// Builds the runner for the parsed arguments.
///
/// `--dry-run` forces the stdout target, so exports never connect and
/// updates never create a missing database.
pub fn build_runner(cli: &Cli, registry: EntityRegistry) -> SchemaToolRunner {
    let runner = SchemaToolRunner::with_default_engines(registry);
    if cli.dry_run {
        runner.with_setting(keys::TARGET, "stdout")
    } else {
        runner
    }
}

/// Runs the schema tool once.
///
/// # Errors
/// Returns every failure except a missing properties path, with context.
pub async fn run(cli: &Cli, registry: EntityRegistry) -> anyhow::Result<RunOutcome> {
    let runner = build_runner(cli, registry);
    runner
        .run(cli.prop_file.as_deref())
        .await
        .context("Schema tool run failed")
}
