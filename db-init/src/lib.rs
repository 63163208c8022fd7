//! Database initializer
//!
//! Waits for a MySQL server to accept connections, then applies a SQL init
//! script to provision schema and seed data:
//! - `connector`: connect with retry until a deadline
//! - `script`: split and execute the init script, commit or roll back
//! - `initializer`: sequence both and always release the session

pub mod config;
pub mod connector;
pub mod error;
pub mod initializer;
pub mod mysql;
pub mod script;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use config::InitConfig;
pub use connector::connect_with_retry;
pub use error::{InitError, StatementFailure};
pub use initializer::Initializer;
pub use mysql::{MySqlConnector, MySqlSession};
pub use script::{execute_script, split_statements, ScriptReport};
pub use session::{Connect, Session};
