//! Connect, run the init script, release the session

use crate::config::InitConfig;
use crate::connector::connect_with_retry;
use crate::error::InitError;
use crate::script::{execute_script, ScriptReport};
use crate::session::{Connect, Session};
use anyhow::anyhow;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::{error, info, warn};

/// Runs one initialization against the database reached by `C`.
pub struct Initializer<C> {
    config: InitConfig,
    connector: C,
}

impl<C: Connect> Initializer<C> {
    pub fn new(config: InitConfig, connector: C) -> Self {
        Self { config, connector }
    }

    pub fn config(&self) -> &InitConfig {
        &self.config
    }

    /// Connect with retry and apply the init script.
    ///
    /// Once connected, the session is closed exactly once before returning,
    /// whether the script succeeded, failed, or the driver panicked.
    pub async fn run(&self) -> Result<ScriptReport, InitError> {
        let mut session = connect_with_retry(&self.connector, &self.config).await?;

        let outcome = AssertUnwindSafe(execute_script(&mut session, &self.config.init_file))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(InitError::Unexpected(panic_error(panic))));

        match session.close().await {
            Ok(()) => info!("Database connection closed"),
            Err(e) => warn!(error = format!("{e:#}"), "Failed to close database connection"),
        }

        outcome
    }

    /// [`Initializer::run`] reduced to pass/fail, logging the failure.
    pub async fn initialize(&self) -> bool {
        match self.run().await {
            Ok(_) => true,
            Err(e) => {
                error!(error = %e, "Initialization failed");
                false
            }
        }
    }
}

fn panic_error(panic: Box<dyn Any + Send>) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    anyhow!("Critical error during initialization: {}", message)
}
