//! Wallet use-case service.
//!
//! # Responsibility
//! - Validate balance-mutation requests before storage is touched.
//! - Supply the business rule (deposit/withdraw) as the mutator of the
//!   repository's atomic apply.
//! - Provide create/amount/get/list/delete entry points for adapters.
//!
//! # Invariants
//! - Non-positive amounts never reach the repository.
//! - Withdraw never drives a balance below zero.
//! - Deposit never exceeds `i64::MAX`; overflow is rejected, not wrapped.
//! - Repository faults propagate unchanged; nothing is retried here.

use crate::model::wallet::{Operation, OperationKind, Wallet, WalletId};
use crate::repo::wallet_repo::{RepoError, WalletRepository};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

/// Service error for wallet use-cases.
#[derive(Debug)]
pub enum WalletServiceError {
    /// Wallet id unknown or deleted.
    NotFound(WalletId),
    /// Amount is zero or negative.
    InvalidAmount(i64),
    /// Operation kind is neither `DEPOSIT` nor `WITHDRAW`.
    InvalidOperationKind(String),
    /// Withdraw exceeds the locked balance.
    InsufficientFunds { balance: i64, requested: i64 },
    /// Deposit would exceed the representable balance ceiling.
    Overflow { balance: i64, amount: i64 },
    /// Transaction or connection-level fault; storage is unchanged.
    Storage(RepoError),
}

impl WalletServiceError {
    /// Stable machine-readable code for adapters and logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::InvalidAmount(_) => "invalid_amount",
            Self::InvalidOperationKind(_) => "invalid_operation_kind",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::Overflow { .. } => "overflow",
            Self::Storage(_) => "storage_failure",
        }
    }
}

impl Display for WalletServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "wallet not found: {id}"),
            Self::InvalidAmount(amount) => write!(f, "amount must be positive, got {amount}"),
            Self::InvalidOperationKind(kind) => {
                write!(f, "invalid operation kind `{kind}`; expected DEPOSIT|WITHDRAW")
            }
            Self::InsufficientFunds { balance, requested } => {
                write!(f, "insufficient funds: balance {balance}, requested {requested}")
            }
            Self::Overflow { balance, amount } => {
                write!(f, "deposit of {amount} would overflow balance {balance}")
            }
            Self::Storage(err) => write!(f, "{err}"),
        }
    }
}

impl Error for WalletServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for WalletServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

pub type WalletServiceResult<T> = Result<T, WalletServiceError>;

/// Wallet service facade over repository implementations.
pub struct WalletService<R: WalletRepository> {
    repo: R,
}

impl<R: WalletRepository> WalletService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Creates a wallet with balance 0.
    pub fn create(&self) -> WalletServiceResult<Wallet> {
        let wallet = self.repo.create_wallet()?;
        info!(
            "event=wallet_create module=service status=ok wallet_id={}",
            wallet.id
        );
        Ok(wallet)
    }

    /// Reads the current balance without taking the row lock.
    pub fn amount(&self, id: WalletId) -> WalletServiceResult<i64> {
        self.get(id).map(|wallet| wallet.balance)
    }

    pub fn get(&self, id: WalletId) -> WalletServiceResult<Wallet> {
        self.repo
            .get_wallet(id)?
            .ok_or(WalletServiceError::NotFound(id))
    }

    /// Lists all wallets. Diagnostic use; no pagination contract.
    pub fn list(&self) -> WalletServiceResult<Vec<Wallet>> {
        Ok(self.repo.list_wallets()?)
    }

    /// Deletes a wallet permanently.
    ///
    /// Waits for any in-flight operation on the same wallet; that wait is
    /// provided by the repository's row lock.
    pub fn delete(&self, id: WalletId) -> WalletServiceResult<()> {
        self.repo.delete_wallet(id)?;
        info!("event=wallet_delete module=service status=ok wallet_id={id}");
        Ok(())
    }

    /// Applies an operation given as raw kind text (`DEPOSIT`/`WITHDRAW`).
    ///
    /// Validation order: amount, then kind, then storage.
    pub fn operation(&self, id: WalletId, kind: &str, amount: i64) -> WalletServiceResult<Wallet> {
        validate_amount(amount)?;
        let kind = kind
            .parse::<OperationKind>()
            .map_err(|err| WalletServiceError::InvalidOperationKind(err.0))?;
        self.apply(&Operation {
            wallet_id: id,
            kind,
            amount,
        })
    }

    pub fn deposit(&self, id: WalletId, amount: i64) -> WalletServiceResult<Wallet> {
        self.apply(&Operation::deposit(id, amount))
    }

    pub fn withdraw(&self, id: WalletId, amount: i64) -> WalletServiceResult<Wallet> {
        self.apply(&Operation::withdraw(id, amount))
    }

    /// Applies one typed operation through the repository's atomic apply.
    ///
    /// # Contract
    /// - Returns the post-mutation wallet on success.
    /// - On any error the stored balance is unchanged.
    pub fn apply(&self, operation: &Operation) -> WalletServiceResult<Wallet> {
        let started_at = Instant::now();
        validate_amount(operation.amount)?;

        let Operation {
            wallet_id,
            kind,
            amount,
        } = *operation;
        let result = self
            .repo
            .operate_atomic(wallet_id, |balance| apply_to_balance(balance, kind, amount));

        match &result {
            Ok(wallet) => info!(
                "event=wallet_operation module=service status=ok wallet_id={} kind={} amount={} balance={} duration_ms={}",
                wallet_id,
                kind,
                amount,
                wallet.balance,
                started_at.elapsed().as_millis()
            ),
            Err(WalletServiceError::Storage(err)) => warn!(
                "event=wallet_operation module=service status=error wallet_id={} kind={} error_code=storage_failure error={}",
                wallet_id, kind, err
            ),
            Err(err) => info!(
                "event=wallet_operation module=service status=rejected wallet_id={} kind={} amount={} error_code={}",
                wallet_id,
                kind,
                amount,
                err.code()
            ),
        }

        result
    }
}

fn validate_amount(amount: i64) -> WalletServiceResult<()> {
    if amount <= 0 {
        return Err(WalletServiceError::InvalidAmount(amount));
    }
    Ok(())
}

/// Business rule applied to the locked balance.
fn apply_to_balance(balance: i64, kind: OperationKind, amount: i64) -> WalletServiceResult<i64> {
    match kind {
        OperationKind::Deposit => balance
            .checked_add(amount)
            .ok_or(WalletServiceError::Overflow { balance, amount }),
        OperationKind::Withdraw => {
            if balance < amount {
                return Err(WalletServiceError::InsufficientFunds {
                    balance,
                    requested: amount,
                });
            }
            Ok(balance - amount)
        }
    }
}
