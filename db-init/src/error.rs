//! Error types for database initialization

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures that abort an initialization run.
///
/// Single-statement failures are not in here; they are recorded as
/// [`StatementFailure`] and the script carries on.
#[derive(Debug, Error)]
pub enum InitError {
    #[error("Timeout after {}s. Could not connect to database ({attempts} attempts)", .timeout.as_secs())]
    ConnectionTimeout { timeout: Duration, attempts: u32 },

    #[error("No active database connection")]
    NoConnection,

    #[error("Initialization file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// Reading the script or committing failed; the session was rolled back.
    #[error("Error executing initialization script: {0:#}")]
    Script(anyhow::Error),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

/// A statement the database rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementFailure {
    pub statement: String,
    pub error: String,
}
