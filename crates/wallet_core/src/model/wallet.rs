//! Wallet domain model.
//!
//! # Responsibility
//! - Define the persisted wallet record and its identity.
//! - Define the transient balance-mutation request (`Operation`).
//!
//! # Invariants
//! - `id` is a random v4 UUID, never reused for another wallet.
//! - `balance` is a non-negative count of the smallest currency unit.
//! - A deleted wallet is gone; there is no tombstone state on the record.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Stable identifier for a wallet.
pub type WalletId = Uuid;

/// Persisted wallet record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Wallet {
    /// Serialized as `walletId` to match the response schema.
    #[serde(rename = "walletId")]
    pub id: WalletId,
    pub balance: i64,
}

impl Wallet {
    /// Creates a new empty wallet with a generated ID.
    pub fn new() -> Self {
        Self::with_id(Uuid::new_v4())
    }

    /// Creates an empty wallet with a caller-provided ID.
    pub fn with_id(id: WalletId) -> Self {
        Self { id, balance: 0 }
    }
}

impl Default for Wallet {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction of a balance mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationKind {
    /// Adds `amount` to the balance.
    Deposit,
    /// Subtracts `amount`, bounded by the current balance.
    Withdraw,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
        }
    }
}

impl Display for OperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when an operation kind string is neither `DEPOSIT` nor `WITHDRAW`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownOperationKind(pub String);

impl Display for UnknownOperationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unknown operation kind `{}`; expected DEPOSIT|WITHDRAW",
            self.0
        )
    }
}

impl Error for UnknownOperationKind {}

impl FromStr for OperationKind {
    type Err = UnknownOperationKind;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            other => Err(UnknownOperationKind(other.to_string())),
        }
    }
}

/// One balance mutation request. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub wallet_id: WalletId,
    #[serde(rename = "operationType")]
    pub kind: OperationKind,
    pub amount: i64,
}

impl Operation {
    pub fn deposit(wallet_id: WalletId, amount: i64) -> Self {
        Self {
            wallet_id,
            kind: OperationKind::Deposit,
            amount,
        }
    }

    pub fn withdraw(wallet_id: WalletId, amount: i64) -> Self {
        Self {
            wallet_id,
            kind: OperationKind::Withdraw,
            amount,
        }
    }
}
