//! `r2d2` connection pool for one SQLite database file.
//!
//! # Responsibility
//! - Migrate the database once before any pooled connection exists.
//! - Map `PoolConfig` onto the `r2d2` builder.
//! - Bootstrap every pooled connection with the same pragmas.
//!
//! # Invariants
//! - Open connections never exceed `PoolConfig::max_size`.
//! - A pooled connection always carries `busy_timeout` and WAL mode.

use super::open::{open_db_with_busy_timeout, set_file_pragmas};
use super::{DbError, DbResult};
use crate::config::PoolConfig;
use log::info;
use r2d2_sqlite::SqliteConnectionManager;
use std::path::Path;

pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// Opens a pool over `path`.
///
/// Migrations run on a dedicated bootstrap connection first, so pooled
/// connections only need pragmas.
pub fn open_pool(path: impl AsRef<Path>, config: &PoolConfig) -> DbResult<SqlitePool> {
    config.validate().map_err(DbError::Config)?;
    let path = path.as_ref();
    drop(open_db_with_busy_timeout(path, config.busy_timeout)?);

    let busy_timeout = config.busy_timeout;
    let manager = SqliteConnectionManager::file(path)
        .with_init(move |conn| set_file_pragmas(conn, busy_timeout));

    let pool = r2d2::Pool::builder()
        .max_size(config.max_size)
        .min_idle(Some(config.max_idle.min(config.max_size)))
        .max_lifetime(Some(config.max_lifetime))
        .idle_timeout(Some(config.idle_timeout))
        .connection_timeout(config.acquire_timeout)
        .build(manager)?;

    info!(
        "event=pool_open module=db status=ok max_size={} max_idle={} max_lifetime_s={} idle_timeout_s={}",
        config.max_size,
        config.max_idle,
        config.max_lifetime.as_secs(),
        config.idle_timeout.as_secs()
    );
    Ok(pool)
}
