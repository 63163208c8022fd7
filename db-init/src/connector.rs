//! Connect with retry until a wall-clock deadline

use crate::config::InitConfig;
use crate::error::InitError;
use crate::session::{Connect, Session};
use anyhow::anyhow;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, error, info, warn};

/// Open a healthy session, retrying every `config.interval` until
/// `config.timeout` has elapsed since the first attempt.
///
/// Each attempt, health check and closing of a rejected session included,
/// is bounded by `config.connect_timeout`. A session that connects but does
/// not report healthy is closed and counts as a failed attempt. The retry
/// sleep never runs past the deadline, so a budget that is not larger than
/// the interval, or smaller than the per-attempt timeout, allows a single
/// attempt.
pub async fn connect_with_retry<C: Connect>(
    connector: &C,
    config: &InitConfig,
) -> Result<C::Session, InitError> {
    let start = Instant::now();
    let mut attempts: u32 = 0;

    while start.elapsed() < config.timeout {
        attempts += 1;
        info!(
            attempt = attempts,
            host = %config.host,
            port = config.port,
            "Connecting to database"
        );

        let failure = match timeout(config.connect_timeout, attempt(connector, config)).await {
            Ok(Ok(session)) => {
                info!(database = %config.database, attempts, "Connected to database");
                return Ok(session);
            }
            Ok(Err(e)) => e,
            Err(_) => anyhow!("no response within {:?}", config.connect_timeout),
        };

        warn!(attempt = attempts, error = format!("{failure:#}"), "Connection attempt failed");

        let remaining = config.timeout.saturating_sub(start.elapsed());
        if config.timeout < config.connect_timeout || remaining <= config.interval {
            break;
        }

        debug!(delay = ?config.interval, remaining = ?remaining, "Retrying");
        sleep(config.interval).await;
    }

    error!(
        timeout = ?config.timeout,
        attempts,
        "Timed out, could not connect to database"
    );
    Err(InitError::ConnectionTimeout {
        timeout: config.timeout,
        attempts,
    })
}

/// One connection attempt: connect, then check the session is usable.
async fn attempt<C: Connect>(connector: &C, config: &InitConfig) -> anyhow::Result<C::Session> {
    let mut session = connector.connect(config).await?;
    if session.is_healthy().await {
        return Ok(session);
    }
    if let Err(e) = session.close().await {
        debug!(error = format!("{e:#}"), "Failed to close unhealthy session");
    }
    Err(anyhow!("connection is not healthy"))
}
