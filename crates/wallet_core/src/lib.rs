//! Core wallet ledger logic.
//! This crate is the single source of truth for balance invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::{ConfigError, DatabaseConfig, PoolConfig};
pub use logging::{default_log_level, init_logging, logging_status, LogOptions, LogTarget};
pub use model::wallet::{Operation, OperationKind, UnknownOperationKind, Wallet, WalletId};
pub use repo::memory_repo::MemoryWalletRepository;
pub use repo::wallet_repo::{RepoError, RepoResult, SqliteWalletRepository, WalletRepository};
pub use service::wallet_service::{WalletService, WalletServiceError, WalletServiceResult};

use db::{open_pool, DbResult};

/// Opens the configured database and wires a SQLite-backed service.
pub fn open_sqlite_service(
    config: &DatabaseConfig,
) -> DbResult<WalletService<SqliteWalletRepository>> {
    let pool = open_pool(&config.path, &config.pool)?;
    Ok(WalletService::new(SqliteWalletRepository::new(pool)))
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
