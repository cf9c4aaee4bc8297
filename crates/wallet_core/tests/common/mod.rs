#![allow(dead_code)]

use std::path::PathBuf;
use std::time::Duration;
use tempfile::TempDir;
use wallet_core::db::open_pool;
use wallet_core::{MemoryWalletRepository, PoolConfig, SqliteWalletRepository, WalletService};

/// SQLite repository over a fresh database file. Keep the `TempDir` alive
/// for the duration of the test.
pub fn sqlite_repo() -> (TempDir, SqliteWalletRepository) {
    sqlite_repo_with(PoolConfig::default())
}

pub fn sqlite_repo_with(config: PoolConfig) -> (TempDir, SqliteWalletRepository) {
    let dir = tempfile::tempdir().unwrap();
    let pool = open_pool(db_path(&dir), &config).unwrap();
    (dir, SqliteWalletRepository::new(pool))
}

pub fn sqlite_service() -> (TempDir, WalletService<SqliteWalletRepository>) {
    let (dir, repo) = sqlite_repo();
    (dir, WalletService::new(repo))
}

pub fn memory_service() -> WalletService<MemoryWalletRepository> {
    WalletService::new(MemoryWalletRepository::new())
}

pub fn db_path(dir: &TempDir) -> PathBuf {
    dir.path().join("wallets.db")
}

pub fn short_busy_timeout() -> PoolConfig {
    PoolConfig {
        busy_timeout: Duration::from_millis(50),
        ..PoolConfig::default()
    }
}
