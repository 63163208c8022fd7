//! Init script execution
//!
//! The script is split on `;` without any SQL tokenizing: a semicolon
//! inside a string literal, a comment or a procedure body splits the
//! statement there. Scripts that need those must avoid `;` in them.

use crate::error::{InitError, StatementFailure};
use crate::session::Session;
use anyhow::Context;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, warn};

/// Outcome of a successful script run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptReport {
    /// Statements the database accepted
    pub executed: usize,
    /// Statements the database rejected and that were skipped
    pub failures: Vec<StatementFailure>,
}

/// Split a script into trimmed, non-empty statements in file order.
pub fn split_statements(script: &str) -> Vec<&str> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Run every statement of `init_file` on `session`, then commit.
///
/// A rejected statement is logged and skipped. Failing to read the file or
/// to commit rolls the session back and aborts with [`InitError::Script`].
/// A missing file returns [`InitError::FileNotFound`] before any statement
/// runs. An empty script succeeds without committing.
pub async fn execute_script<S: Session>(
    session: &mut S,
    init_file: &Path,
) -> Result<ScriptReport, InitError> {
    if !session.is_healthy().await {
        error!("No active database connection");
        return Err(InitError::NoConnection);
    }

    match fs::try_exists(init_file).await {
        Ok(true) => {}
        Ok(false) => {
            error!(path = %init_file.display(), "Initialization file not found");
            return Err(InitError::FileNotFound(init_file.to_path_buf()));
        }
        Err(e) => {
            let e = anyhow::Error::new(e)
                .context(format!("Failed to check {}", init_file.display()));
            return Err(abort(session, e).await);
        }
    }

    let script = match fs::read_to_string(init_file)
        .await
        .with_context(|| format!("Failed to read {}", init_file.display()))
    {
        Ok(script) => script,
        Err(e) => return Err(abort(session, e).await),
    };

    if script.trim().is_empty() {
        warn!(path = %init_file.display(), "Initialization file is empty");
        return Ok(ScriptReport::default());
    }

    let mut report = ScriptReport::default();
    for statement in split_statements(&script) {
        match session.execute(statement).await {
            Ok(()) => report.executed += 1,
            Err(e) => {
                let error = format!("{e:#}");
                warn!(statement, error = %error, "Error executing command");
                report.failures.push(StatementFailure {
                    statement: statement.to_string(),
                    error,
                });
            }
        }
    }

    if let Err(e) = session
        .commit()
        .await
        .context("Failed to commit initialization script")
    {
        return Err(abort(session, e).await);
    }

    info!(
        executed = report.executed,
        failed = report.failures.len(),
        "Database initialized successfully"
    );
    Ok(report)
}

async fn abort<S: Session>(session: &mut S, cause: anyhow::Error) -> InitError {
    error!(error = format!("{cause:#}"), "Error executing initialization script");
    if let Err(e) = session.rollback().await {
        warn!(error = format!("{e:#}"), "Rollback failed");
    }
    InitError::Script(cause)
}
