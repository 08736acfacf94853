//! Statement targets.

use crate::Result;
use crate::config::{ExportOptions, TargetType};
use crate::error::SchemaToolError;
use std::io::Write as _;
use tokio::io::AsyncWriteExt;

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
use crate::database::DatabaseConnection;

/// Writes statements to the script and stdout targets, if selected.
pub(crate) async fn write_targets(options: &ExportOptions, statements: &[String]) -> Result<()> {
    let script = render_script(statements, &options.delimiter);

    if options.includes(TargetType::Script)
        && let Some(path) = &options.script_output
    {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .append(options.append)
            .truncate(!options.append)
            .open(path)
            .await
            .map_err(|e| {
                SchemaToolError::io(format!("Failed to open script file {}", path.display()), e)
            })?;
        file.write_all(script.as_bytes()).await.map_err(|e| {
            SchemaToolError::io(format!("Failed to write script file {}", path.display()), e)
        })?;
        file.flush().await.map_err(|e| {
            SchemaToolError::io(format!("Failed to flush script file {}", path.display()), e)
        })?;
        tracing::info!("Wrote {} statements to {}", statements.len(), path.display());
    }

    if options.includes(TargetType::Stdout) {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(script.as_bytes())
            .and_then(|()| stdout.flush())
            .map_err(|e| SchemaToolError::io("Failed to write statements to stdout", e))?;
    }

    Ok(())
}

/// One statement per line, each followed by the delimiter.
pub(crate) fn render_script(statements: &[String], delimiter: &str) -> String {
    statements
        .iter()
        .map(|statement| format!("{}{}\n", statement, delimiter))
        .collect()
}

/// Executes statements in order, stopping at the first failure.
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub(crate) async fn execute_all(
    connection: &DatabaseConnection,
    statements: &[String],
    show_sql: bool,
) -> Result<()> {
    for statement in statements {
        log_statement(statement, show_sql);
        connection.execute(statement).await?;
    }
    Ok(())
}

/// Executes every statement, logging failures instead of stopping.
///
/// Used for the drop phase, where objects may not exist yet.
#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
pub(crate) async fn execute_ignoring_failures(
    connection: &DatabaseConnection,
    statements: &[String],
    show_sql: bool,
) -> usize {
    let mut failed = 0_usize;
    for statement in statements {
        log_statement(statement, show_sql);
        if let Err(e) = connection.execute(statement).await {
            tracing::warn!("Unsuccessful: {}", e);
            failed = failed.saturating_add(1);
        }
    }
    failed
}

#[cfg(any(feature = "postgresql", feature = "mysql", feature = "sqlite"))]
fn log_statement(statement: &str, show_sql: bool) {
    if show_sql {
        tracing::info!("{}", statement);
    } else {
        tracing::debug!("Executing: {}", statement);
    }
}
