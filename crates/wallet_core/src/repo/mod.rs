//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the wallet data access contract, including the atomic apply.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Balance writes happen only inside `operate_atomic`.
//! - Repository APIs return semantic errors (`NotFound`) in addition to DB
//!   transport errors.

pub mod memory_repo;
pub mod wallet_repo;
