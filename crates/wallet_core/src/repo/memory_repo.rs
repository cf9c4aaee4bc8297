//! In-process wallet repository with per-row locking.
//!
//! # Responsibility
//! - Provide a non-durable `WalletRepository` backend for embedding and
//!   tests.
//! - Serialize mutations per wallet while leaving distinct wallets fully
//!   parallel.
//!
//! # Invariants
//! - Each wallet row owns one exclusive lock; `operate_atomic` and
//!   `delete_wallet` hold it for their whole read-mutate-write.
//! - A deleted row is emptied under its lock before it leaves the index,
//!   so callers already waiting on that lock observe `NotFound`.
//! - The slot is written only after the mutator returns `Ok`.

use crate::model::wallet::{Wallet, WalletId};
use crate::repo::wallet_repo::{RepoError, RepoResult, WalletRepository};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::Arc;

/// `None` once the wallet has been deleted.
type RowSlot = Arc<Mutex<Option<i64>>>;

#[derive(Debug, Default)]
pub struct MemoryWalletRepository {
    rows: DashMap<WalletId, RowSlot>,
}

impl MemoryWalletRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn row(&self, id: WalletId) -> Option<RowSlot> {
        // Clone the Arc so no shard lock is held while waiting on the row.
        self.rows.get(&id).map(|entry| Arc::clone(entry.value()))
    }
}

impl WalletRepository for MemoryWalletRepository {
    fn create_wallet(&self) -> RepoResult<Wallet> {
        let wallet = Wallet::new();
        self.rows
            .insert(wallet.id, Arc::new(Mutex::new(Some(wallet.balance))));
        Ok(wallet)
    }

    fn get_wallet(&self, id: WalletId) -> RepoResult<Option<Wallet>> {
        let Some(row) = self.row(id) else {
            return Ok(None);
        };
        let balance = *row.lock();
        Ok(balance.map(|balance| Wallet { id, balance }))
    }

    fn list_wallets(&self) -> RepoResult<Vec<Wallet>> {
        let rows: Vec<(WalletId, RowSlot)> = self
            .rows
            .iter()
            .map(|entry| (*entry.key(), Arc::clone(entry.value())))
            .collect();

        let mut wallets: Vec<Wallet> = rows
            .into_iter()
            .filter_map(|(id, row)| {
                let balance = *row.lock();
                balance.map(|balance| Wallet { id, balance })
            })
            .collect();
        wallets.sort_by_key(|wallet| wallet.id);
        Ok(wallets)
    }

    fn delete_wallet(&self, id: WalletId) -> RepoResult<()> {
        let row = self.row(id).ok_or(RepoError::NotFound(id))?;
        let mut slot = row.lock();
        if slot.take().is_none() {
            return Err(RepoError::NotFound(id));
        }
        self.rows.remove(&id);
        Ok(())
    }

    fn operate_atomic<F, E>(&self, id: WalletId, mutate: F) -> Result<Wallet, E>
    where
        F: FnOnce(i64) -> Result<i64, E>,
        E: From<RepoError>,
    {
        let row = self.row(id).ok_or(RepoError::NotFound(id))?;
        let mut slot = row.lock();
        let balance = (*slot).ok_or(RepoError::NotFound(id))?;

        let proposed = mutate(balance)?;
        if proposed < 0 {
            return Err(RepoError::NegativeBalance { id, proposed }.into());
        }

        *slot = Some(proposed);
        Ok(Wallet {
            id,
            balance: proposed,
        })
    }
}
