//! Wallet repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide create/get/list/delete over canonical `wallets` storage.
//! - Provide the locked read-mutate-write primitive (`operate_atomic`)
//!   every balance change goes through.
//!
//! # Invariants
//! - Balances are never read and then written in separate transactions.
//! - A rejected mutation writes nothing; the stored balance is unchanged.
//! - A proposed negative balance is rejected before any SQL write.

use crate::db::{DbError, SqlitePool};
use crate::model::wallet::{Wallet, WalletId};
use log::{debug, warn};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;
use uuid::Uuid;

const WALLET_SELECT_SQL: &str = "SELECT id, balance FROM wallets";

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for wallet persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound(WalletId),
    /// A mutation proposed a balance below zero.
    NegativeBalance {
        id: WalletId,
        proposed: i64,
    },
    InvalidData(String),
}

impl RepoError {
    /// Whether this is a transaction/connection-level fault rather than a
    /// semantic outcome. Such faults leave storage unchanged and are safe
    /// for the caller to retry.
    pub fn is_storage_failure(&self) -> bool {
        matches!(self, Self::Db(_))
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "wallet not found: {id}"),
            Self::NegativeBalance { id, proposed } => {
                write!(f, "refusing negative balance {proposed} for wallet {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted wallet data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound(_) | Self::NegativeBalance { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<r2d2::Error> for RepoError {
    fn from(value: r2d2::Error) -> Self {
        Self::Db(DbError::Pool(value))
    }
}

/// Repository interface for wallet storage.
///
/// Any backend offering an exclusive read-lock-then-write within one
/// transaction can implement this trait.
pub trait WalletRepository {
    fn create_wallet(&self) -> RepoResult<Wallet>;
    fn get_wallet(&self, id: WalletId) -> RepoResult<Option<Wallet>>;
    fn list_wallets(&self) -> RepoResult<Vec<Wallet>>;
    fn delete_wallet(&self, id: WalletId) -> RepoResult<()>;

    /// Applies `mutate` to the wallet balance under an exclusive row lock.
    ///
    /// # Contract
    /// - Missing wallet: returns `RepoError::NotFound` converted into `E`;
    ///   `mutate` is never called.
    /// - `mutate` error: nothing is written and the error is returned
    ///   unchanged.
    /// - Success: the returned balance is written and committed in the same
    ///   transaction that read it.
    /// - Concurrent calls for the same `id` wait for each other. Whether
    ///   calls for different ids contend depends on the backend's lock
    ///   granularity.
    fn operate_atomic<F, E>(&self, id: WalletId, mutate: F) -> Result<Wallet, E>
    where
        F: FnOnce(i64) -> Result<i64, E>,
        E: From<RepoError>;
}

/// SQLite-backed wallet repository.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct SqliteWalletRepository {
    pool: SqlitePool,
}

impl SqliteWalletRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl WalletRepository for SqliteWalletRepository {
    fn create_wallet(&self) -> RepoResult<Wallet> {
        let wallet = Wallet::new();
        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO wallets (id, balance) VALUES (?1, ?2);",
            params![wallet.id.to_string(), wallet.balance],
        )?;
        Ok(wallet)
    }

    fn get_wallet(&self, id: WalletId) -> RepoResult<Option<Wallet>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!("{WALLET_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_wallet_row(row)?));
        }

        Ok(None)
    }

    fn list_wallets(&self) -> RepoResult<Vec<Wallet>> {
        let conn = self.pool.get()?;
        let mut stmt = conn.prepare(&format!(
            "{WALLET_SELECT_SQL} ORDER BY created_at ASC, id ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut wallets = Vec::new();

        while let Some(row) = rows.next()? {
            wallets.push(parse_wallet_row(row)?);
        }

        Ok(wallets)
    }

    fn delete_wallet(&self, id: WalletId) -> RepoResult<()> {
        // Autocommit DELETE takes the write lock, so it waits for any
        // in-flight operate_atomic on this database to finish first.
        let conn = self.pool.get()?;
        let changed = conn.execute("DELETE FROM wallets WHERE id = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn operate_atomic<F, E>(&self, id: WalletId, mutate: F) -> Result<Wallet, E>
    where
        F: FnOnce(i64) -> Result<i64, E>,
        E: From<RepoError>,
    {
        let started_at = Instant::now();
        let mut conn = self.pool.get().map_err(RepoError::from)?;

        // SQLite has no SELECT ... FOR UPDATE; BEGIN IMMEDIATE acquires the
        // database write lock before the read. That excludes writers on
        // every wallet, not just this one; they wait up to busy_timeout.
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(RepoError::from)?;

        let Some(balance) = load_balance(&tx, id)? else {
            return Err(RepoError::NotFound(id).into());
        };

        let proposed = match mutate(balance) {
            Ok(value) => value,
            Err(err) => {
                if let Err(rollback_err) = tx.rollback() {
                    warn!(
                        "event=wallet_apply module=repo status=error error_code=rollback_failed wallet_id={} error={}",
                        id, rollback_err
                    );
                }
                debug!(
                    "event=wallet_apply module=repo status=rejected wallet_id={} duration_ms={}",
                    id,
                    started_at.elapsed().as_millis()
                );
                return Err(err);
            }
        };

        if proposed < 0 {
            return Err(RepoError::NegativeBalance { id, proposed }.into());
        }

        let changed = tx
            .execute(
                "UPDATE wallets
                 SET balance = ?1,
                     updated_at = (strftime('%s', 'now') * 1000)
                 WHERE id = ?2;",
                params![proposed, id.to_string()],
            )
            .map_err(RepoError::from)?;
        if changed == 0 {
            return Err(RepoError::NotFound(id).into());
        }

        tx.commit().map_err(RepoError::from)?;
        debug!(
            "event=wallet_apply module=repo status=ok wallet_id={} duration_ms={}",
            id,
            started_at.elapsed().as_millis()
        );

        Ok(Wallet {
            id,
            balance: proposed,
        })
    }
}

fn load_balance(conn: &Connection, id: WalletId) -> RepoResult<Option<i64>> {
    let balance = conn
        .query_row(
            "SELECT balance FROM wallets WHERE id = ?1;",
            [id.to_string()],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    Ok(balance)
}

fn parse_wallet_row(row: &Row<'_>) -> RepoResult<Wallet> {
    let id_text: String = row.get("id")?;
    let id = Uuid::parse_str(&id_text).map_err(|_| {
        RepoError::InvalidData(format!("invalid uuid value `{id_text}` in wallets.id"))
    })?;

    let balance: i64 = row.get("balance")?;
    if balance < 0 {
        return Err(RepoError::InvalidData(format!(
            "negative balance `{balance}` in wallets.balance for {id}"
        )));
    }

    Ok(Wallet { id, balance })
}
