//! Initializer configuration
//!
//! Built once at startup and passed by reference to every stage.

use common::ConfigExt;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_INIT_FILE: &str = "init.sql";
pub const DEFAULT_PORT: u16 = 3306;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Connection parameters and retry budget for one initialization run
#[derive(Clone)]
pub struct InitConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub init_file: PathBuf,
    /// Total wall-clock budget for connecting
    pub timeout: Duration,
    /// Pause between failed connection attempts
    pub interval: Duration,
    /// Bound on a single connection attempt
    pub connect_timeout: Duration,
}

impl Default for InitConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            user: String::new(),
            password: String::new(),
            database: String::new(),
            init_file: PathBuf::from(DEFAULT_INIT_FILE),
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }
}

impl InitConfig {
    /// Replace connection parameters with `DB_HOST`, `DB_PORT`, `DB_USER`,
    /// `DB_PASSWORD` and `DB_NAME` where those are set.
    ///
    /// The current values act as defaults. Script path and timings are
    /// never taken from the environment.
    pub fn with_env_overrides(self) -> Self {
        Self {
            host: String::env_or("DB_HOST", &self.host),
            port: u16::env_parse("DB_PORT", self.port),
            user: String::env_or("DB_USER", &self.user),
            password: String::env_or("DB_PASSWORD", &self.password),
            database: String::env_or("DB_NAME", &self.database),
            ..self
        }
    }
}

impl fmt::Debug for InitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InitConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("database", &self.database)
            .field("init_file", &self.init_file)
            .field("timeout", &self.timeout)
            .field("interval", &self.interval)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}
