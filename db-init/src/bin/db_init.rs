//! Database init runner
//!
//! Waits for the database to accept connections, applies the init script
//! and exits 0 on success, 1 on any failure. Connection parameters given
//! on the command line are overridden by DB_HOST, DB_PORT, DB_USER,
//! DB_PASSWORD and DB_NAME (also read from a `.env` file).

use clap::Parser;
use common::init_logging;
use db_init::config::{DEFAULT_INIT_FILE, DEFAULT_PORT};
use db_init::{InitConfig, Initializer, MySqlConnector};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{debug, error, info};

/// Wait for a MySQL database and apply an init script
#[derive(Parser, Debug)]
#[command(name = "db-init", version)]
struct Args {
    /// SQL script to apply
    #[arg(long, default_value = DEFAULT_INIT_FILE)]
    init_file: PathBuf,

    /// Total seconds to keep trying to connect
    #[arg(long, default_value_t = 60)]
    timeout: u64,

    /// Seconds to wait between connection attempts
    #[arg(long, default_value_t = 5)]
    interval: u64,

    /// Seconds before a single connection attempt is abandoned
    #[arg(long, default_value_t = 5)]
    connect_timeout: u64,

    /// Database host (DB_HOST overrides)
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Database port (DB_PORT overrides)
    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Database user (DB_USER overrides)
    #[arg(long, default_value = "testuser")]
    user: String,

    /// Database password (DB_PASSWORD overrides)
    #[arg(long, default_value = "testpassword")]
    password: String,

    /// Database name (DB_NAME overrides)
    #[arg(long, default_value = "testdb")]
    database: String,
}

impl Args {
    fn into_config(self) -> InitConfig {
        InitConfig {
            host: self.host,
            port: self.port,
            user: self.user,
            password: self.password,
            database: self.database,
            init_file: self.init_file,
            timeout: Duration::from_secs(self.timeout),
            interval: Duration::from_secs(self.interval),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env before logging so RUST_LOG from the file applies
    let dotenv = dotenvy::dotenv();
    let _guard = init_logging("db-init");

    match dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded environment file"),
        Err(e) if e.not_found() => {}
        Err(e) => error!(error = %e, "Failed to load .env file"),
    }

    let config = Args::parse().into_config().with_env_overrides();
    let initializer = Initializer::new(config, MySqlConnector);

    info!(
        host = %initializer.config().host,
        database = %initializer.config().database,
        init_file = %initializer.config().init_file.display(),
        "Database initialization starting"
    );

    if initializer.initialize().await {
        info!("Database initialization completed successfully");
        ExitCode::SUCCESS
    } else {
        error!("Database initialization failed");
        ExitCode::FAILURE
    }
}
