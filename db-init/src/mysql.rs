//! MySQL backend built on sqlx

use crate::config::InitConfig;
use crate::session::{Connect, Session};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::{Connection, Executor};
use tracing::debug;

/// Opens a single [`MySqlConnection`] per attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    fn options(config: &InitConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password);

        if config.database.is_empty() {
            options
        } else {
            options.database(&config.database)
        }
    }
}

#[async_trait]
impl Connect for MySqlConnector {
    type Session = MySqlSession;

    async fn connect(&self, config: &InitConfig) -> Result<MySqlSession> {
        let mut conn = MySqlConnection::connect_with(&Self::options(config))
            .await
            .with_context(|| format!("Failed to connect to MySQL at {}:{}", config.host, config.port))?;

        // Statements accumulate until the explicit COMMIT/ROLLBACK.
        Executor::execute(&mut conn, sqlx::raw_sql("SET autocommit = 0"))
            .await
            .context("Failed to disable autocommit")?;

        debug!(host = %config.host, port = config.port, "MySQL session opened");
        Ok(MySqlSession { conn })
    }
}

/// A MySQL session with autocommit disabled.
pub struct MySqlSession {
    conn: MySqlConnection,
}

#[async_trait]
impl Session for MySqlSession {
    async fn execute(&mut self, statement: &str) -> Result<()> {
        // Unprepared: MySQL cannot prepare every DDL statement.
        Executor::execute(&mut self.conn, sqlx::raw_sql(statement)).await?;
        Ok(())
    }

    async fn is_healthy(&mut self) -> bool {
        self.conn.ping().await.is_ok()
    }

    async fn commit(&mut self) -> Result<()> {
        Executor::execute(&mut self.conn, sqlx::raw_sql("COMMIT"))
            .await
            .context("COMMIT failed")?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<()> {
        Executor::execute(&mut self.conn, sqlx::raw_sql("ROLLBACK"))
            .await
            .context("ROLLBACK failed")?;
        Ok(())
    }

    async fn close(self) -> Result<()> {
        self.conn.close().await.context("Failed to close MySQL connection")
    }
}
