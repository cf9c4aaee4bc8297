//! Wallet ledger domain model.
//!
//! # Responsibility
//! - Define canonical data structures used by repositories and services.
//!
//! # Invariants
//! - Every wallet is identified by a stable, random `WalletId`.
//! - Deletion is a hard delete; the model carries no tombstone flag.

pub mod wallet;
