//! Core use-case services.
//!
//! # Responsibility
//! - Enforce wallet business rules and orchestrate repository calls.
//! - Keep adapter layers decoupled from storage details.

pub mod wallet_service;
