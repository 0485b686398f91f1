use crate::error::{Error, Result};
use sqlparser::dialect::{Dialect, MySqlDialect, PostgreSqlDialect};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// The database engine a session is bound to. Selected once at startup and
/// threaded explicitly through classification and connection.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum EngineKind {
    #[default]
    MySql,
    Postgres,
}

impl EngineKind {
    /// The SQL dialect used to classify statements for this engine.
    #[must_use]
    pub fn dialect(&self) -> Box<dyn Dialect> {
        match self {
            EngineKind::MySql => Box::new(MySqlDialect {}),
            EngineKind::Postgres => Box::new(PostgreSqlDialect {}),
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineKind::MySql => write!(f, "mysql"),
            EngineKind::Postgres => write!(f, "postgres"),
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(EngineKind::MySql),
            "postgres" | "postgresql" | "pg" => Ok(EngineKind::Postgres),
            _ => Err(Error::ConfigurationError(format!(
                "Unsupported database type: {value}. Use 'mysql' or 'postgres'."
            ))),
        }
    }
}

/// Connection settings for MySQL-compatible engines.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct MySqlConfig {
    pub host: String,
    pub port: u16,
    /// Unix socket path; overrides host and port when set.
    pub socket: Option<String>,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub ssl: bool,
    /// Verify the server certificate when TLS is required.
    pub ssl_verify: bool,
    /// Enter `SET SESSION TRANSACTION READ ONLY` on the read path; disable
    /// for engines that do not support the directive.
    pub read_only_transactions: bool,
}

impl Default for MySqlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3306,
            socket: None,
            user: "root".to_string(),
            password: String::new(),
            database: None,
            pool_size: 10,
            connect_timeout: Duration::from_millis(10_000),
            ssl: false,
            ssl_verify: false,
            read_only_transactions: true,
        }
    }
}

/// Connection settings for PostgreSQL.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: Option<String>,
    pub pool_size: u32,
    pub connect_timeout: Duration,
    pub idle_timeout: Duration,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: None,
            pool_size: 10,
            connect_timeout: Duration::from_millis(10_000),
            idle_timeout: Duration::from_millis(30_000),
        }
    }
}
