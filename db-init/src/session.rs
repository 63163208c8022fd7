//! Database session abstraction
//!
//! The connector and script runner only talk to the database through these
//! traits, so the production driver can be swapped for an in-memory fake.

use crate::config::InitConfig;
use anyhow::Result;
use async_trait::async_trait;

/// A live database session.
///
/// Statements run inside one session-wide transaction that is finished by
/// [`Session::commit`] or [`Session::rollback`].
#[async_trait]
pub trait Session: Send + Sized {
    /// Execute a single SQL statement.
    async fn execute(&mut self, statement: &str) -> Result<()>;

    /// Whether the session is still connected and usable.
    async fn is_healthy(&mut self) -> bool;

    async fn commit(&mut self) -> Result<()>;

    async fn rollback(&mut self) -> Result<()>;

    /// Release the session. Consumes it, so it cannot be closed twice.
    async fn close(self) -> Result<()>;
}

/// A single connection attempt.
#[async_trait]
pub trait Connect: Send + Sync {
    type Session: Session;

    /// Open one session. Retrying and the per-attempt timeout are handled
    /// by the caller.
    async fn connect(&self, config: &InitConfig) -> Result<Self::Session>;
}
