//! Storage configuration passed to component constructors at startup.
//!
//! # Responsibility
//! - Describe where the wallet database lives and how its connections are
//!   pooled.
//! - Load overrides from process environment (and an optional `.env`).
//!
//! # Invariants
//! - Configuration is an explicit value; nothing in core reads it from
//!   global state after startup.
//! - `max_size` and `max_idle` are never zero after validation.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_DB_PATH: &str = "WALLET_DB_PATH";
pub const ENV_MAX_CONNS: &str = "WALLET_DB_MAX_CONNS";
pub const ENV_MAX_IDLE_CONNS: &str = "WALLET_DB_MAX_IDLE_CONNS";
pub const ENV_CONN_MAX_LIFETIME_SECS: &str = "WALLET_DB_CONN_MAX_LIFETIME";
pub const ENV_CONN_MAX_IDLE_TIME_SECS: &str = "WALLET_DB_CONN_MAX_IDLE_TIME";
pub const ENV_BUSY_TIMEOUT_MS: &str = "WALLET_DB_BUSY_TIMEOUT_MS";

const DEFAULT_DB_FILE_NAME: &str = "wallets.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidNumber { key: &'static str, value: String },
    ZeroPoolSize { key: &'static str },
    EnvFile(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidNumber { key, value } => {
                write!(f, "{key} must be a non-negative integer, got `{value}`")
            }
            Self::ZeroPoolSize { key } => write!(f, "{key} must be greater than zero"),
            Self::EnvFile(message) => write!(f, "invalid .env file: {message}"),
        }
    }
}

impl Error for ConfigError {}

/// Connection pool tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Upper bound on simultaneously open connections.
    pub max_size: u32,
    /// Idle connections the pool keeps ready; capped at `max_size`.
    pub max_idle: u32,
    /// Connections older than this are closed instead of reused.
    pub max_lifetime: Duration,
    /// Connections unused for longer than this are closed.
    pub idle_timeout: Duration,
    /// How long a caller waits for a free connection.
    pub acquire_timeout: Duration,
    /// How long a statement waits on another transaction's lock.
    pub busy_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 16,
            max_idle: 8,
            max_lifetime: Duration::from_secs(2 * 60 * 60),
            idle_timeout: Duration::from_secs(10 * 60),
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::ZeroPoolSize { key: ENV_MAX_CONNS });
        }
        if self.max_idle == 0 {
            return Err(ConfigError::ZeroPoolSize {
                key: ENV_MAX_IDLE_CONNS,
            });
        }
        Ok(())
    }
}

/// Database location plus pool tunables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub pool: PoolConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            pool: PoolConfig::default(),
        }
    }
}

impl DatabaseConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pool: PoolConfig::default(),
        }
    }

    /// Builds configuration from defaults overridden by environment.
    ///
    /// A `.env` file in the working directory is loaded first when present;
    /// variables already set in the process win over it. A missing file is
    /// fine, a malformed one is an error.
    pub fn from_env() -> Result<Self, ConfigError> {
        accept_env_file(dotenvy::dotenv().map(|_| ()))?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// Missing keys keep their defaults; empty values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(path) = get(ENV_DB_PATH) {
            config.path = PathBuf::from(path.trim());
        }
        if let Some(value) = get(ENV_MAX_CONNS) {
            config.pool.max_size = parse_u32(ENV_MAX_CONNS, &value)?;
        }
        if let Some(value) = get(ENV_MAX_IDLE_CONNS) {
            config.pool.max_idle = parse_u32(ENV_MAX_IDLE_CONNS, &value)?;
        }
        if let Some(value) = get(ENV_CONN_MAX_LIFETIME_SECS) {
            config.pool.max_lifetime =
                Duration::from_secs(parse_u64(ENV_CONN_MAX_LIFETIME_SECS, &value)?);
        }
        if let Some(value) = get(ENV_CONN_MAX_IDLE_TIME_SECS) {
            config.pool.idle_timeout =
                Duration::from_secs(parse_u64(ENV_CONN_MAX_IDLE_TIME_SECS, &value)?);
        }
        if let Some(value) = get(ENV_BUSY_TIMEOUT_MS) {
            config.pool.busy_timeout =
                Duration::from_millis(parse_u64(ENV_BUSY_TIMEOUT_MS, &value)?);
        }

        config.pool.validate()?;
        Ok(config)
    }
}

fn accept_env_file(loaded: dotenvy::Result<()>) -> Result<(), ConfigError> {
    match loaded {
        Ok(()) => Ok(()),
        Err(err) if err.not_found() => Ok(()),
        Err(err) => Err(ConfigError::EnvFile(err.to_string())),
    }
}

fn parse_u64(key: &'static str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}

fn parse_u32(key: &'static str, value: &str) -> Result<u32, ConfigError> {
    value
        .trim()
        .parse::<u32>()
        .map_err(|_| ConfigError::InvalidNumber {
            key,
            value: value.to_string(),
        })
}
