//! Command-line adapter over the wallet service.
//!
//! # Responsibility
//! - Decode one request from argv, call `WalletService`, print one JSON
//!   response on stdout.
//! - Map service errors to a stable `{"error": code, "detail": text}`
//!   envelope and a non-zero exit status.

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;
use wallet_core::{
    default_log_level, init_logging, open_sqlite_service, DatabaseConfig, LogOptions, Wallet,
    WalletServiceError,
};

#[derive(Debug, Parser)]
#[command(name = "wallet", version, about = "Wallet ledger command-line client")]
struct Cli {
    /// SQLite database file; overrides WALLET_DB_PATH.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error).
    #[arg(long, global = true, env = "WALLET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Absolute directory for rolling log files; logs go to stderr if unset.
    #[arg(long, global = true, env = "WALLET_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create a wallet with balance 0.
    Create,
    /// List all wallets.
    List,
    /// Print the balance of one wallet.
    Amount { id: Uuid },
    /// Delete a wallet permanently.
    Delete { id: Uuid },
    /// Apply DEPOSIT or WITHDRAW given as text.
    Operation {
        id: Uuid,
        kind: String,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Add funds to a wallet.
    Deposit {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
    /// Remove funds from a wallet.
    Withdraw {
        id: Uuid,
        #[arg(allow_negative_numbers = true)]
        amount: i64,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WalletResponse {
    wallet_id: Uuid,
    balance: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
}

impl WalletResponse {
    fn new(wallet: Wallet, message: Option<&'static str>) -> Self {
        Self {
            wallet_id: wallet.id,
            balance: wallet.balance,
            message,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = cli
        .log_level
        .clone()
        .unwrap_or_else(|| default_log_level().to_string());
    let log_options = match &cli.log_dir {
        Some(dir) => LogOptions::directory(level, dir),
        None => LogOptions::stderr(level),
    };
    if let Err(err) = init_logging(&log_options) {
        return print_error("invalid_logging", err);
    }

    let mut config = match DatabaseConfig::from_env() {
        Ok(config) => config,
        Err(err) => return print_error("invalid_config", err.to_string()),
    };
    if let Some(path) = cli.db {
        config.path = path;
    }

    let service = match open_sqlite_service(&config) {
        Ok(service) => service,
        Err(err) => return print_error("storage_failure", err.to_string()),
    };

    let outcome: Result<serde_json::Value, WalletServiceError> = match cli.command {
        Command::Create => service
            .create()
            .map(|wallet| to_json(&WalletResponse::new(wallet, Some("Wallet created")))),
        Command::List => service.list().map(|wallets| {
            let items: Vec<_> = wallets
                .into_iter()
                .map(|wallet| WalletResponse::new(wallet, None))
                .collect();
            to_json(&items)
        }),
        Command::Amount { id } => service
            .amount(id)
            .map(|amount| serde_json::json!({ "amount": amount })),
        Command::Delete { id } => service
            .delete(id)
            .map(|()| serde_json::json!({ "message": "Wallet deleted" })),
        Command::Operation { id, kind, amount } => service
            .operation(id, &kind, amount)
            .map(|wallet| to_json(&WalletResponse::new(wallet, None))),
        Command::Deposit { id, amount } => service
            .deposit(id, amount)
            .map(|wallet| to_json(&WalletResponse::new(wallet, None))),
        Command::Withdraw { id, amount } => service
            .withdraw(id, amount)
            .map(|wallet| to_json(&WalletResponse::new(wallet, None))),
    };

    match outcome {
        Ok(value) => {
            println!("{value}");
            ExitCode::SUCCESS
        }
        Err(err) => print_error(err.code(), err.to_string()),
    }
}

fn to_json<T: Serialize>(value: &T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn print_error(code: &'static str, detail: String) -> ExitCode {
    let body = ErrorResponse {
        error: code,
        detail,
    };
    println!("{}", to_json(&body));
    ExitCode::FAILURE
}
