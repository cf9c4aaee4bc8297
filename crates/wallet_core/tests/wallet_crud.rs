mod common;

use std::collections::HashSet;
use wallet_core::{MemoryWalletRepository, RepoError, WalletRepository};

fn create_and_get_roundtrip(repo: &impl WalletRepository) {
    let wallet = repo.create_wallet().unwrap();
    assert_eq!(wallet.balance, 0);

    let loaded = repo.get_wallet(wallet.id).unwrap().unwrap();
    assert_eq!(loaded, wallet);
}

fn list_returns_every_wallet(repo: &impl WalletRepository) {
    let created: HashSet<_> = (0..3).map(|_| repo.create_wallet().unwrap().id).collect();

    let listed: HashSet<_> = repo
        .list_wallets()
        .unwrap()
        .into_iter()
        .map(|wallet| wallet.id)
        .collect();
    assert_eq!(listed, created);
}

fn delete_removes_row_permanently(repo: &impl WalletRepository) {
    let wallet = repo.create_wallet().unwrap();
    repo.delete_wallet(wallet.id).unwrap();

    assert!(repo.get_wallet(wallet.id).unwrap().is_none());
    assert!(repo.list_wallets().unwrap().is_empty());

    let err = repo.delete_wallet(wallet.id).unwrap_err();
    assert!(matches!(err, RepoError::NotFound(id) if id == wallet.id));
}

fn operate_atomic_on_missing_wallet_skips_mutator(repo: &impl WalletRepository) {
    let missing = uuid::Uuid::new_v4();
    let mut called = false;

    let err = repo
        .operate_atomic(missing, |balance| {
            called = true;
            Ok::<_, RepoError>(balance + 1)
        })
        .unwrap_err();

    assert!(matches!(err, RepoError::NotFound(id) if id == missing));
    assert!(!called);
}

fn operate_atomic_writes_mutator_result(repo: &impl WalletRepository) {
    let wallet = repo.create_wallet().unwrap();

    let updated = repo
        .operate_atomic(wallet.id, |balance| Ok::<_, RepoError>(balance + 40))
        .unwrap();
    assert_eq!(updated.balance, 40);
    assert_eq!(repo.get_wallet(wallet.id).unwrap().unwrap().balance, 40);
}

fn operate_atomic_refuses_negative_balance(repo: &impl WalletRepository) {
    let wallet = repo.create_wallet().unwrap();

    let err = repo
        .operate_atomic(wallet.id, |balance| Ok::<_, RepoError>(balance - 1))
        .unwrap_err();

    assert!(matches!(
        err,
        RepoError::NegativeBalance { id, proposed: -1 } if id == wallet.id
    ));
    assert_eq!(repo.get_wallet(wallet.id).unwrap().unwrap().balance, 0);
}

#[test]
fn sqlite_create_and_get_roundtrip() {
    let (_dir, repo) = common::sqlite_repo();
    create_and_get_roundtrip(&repo);
}

#[test]
fn memory_create_and_get_roundtrip() {
    create_and_get_roundtrip(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_list_returns_every_wallet() {
    let (_dir, repo) = common::sqlite_repo();
    list_returns_every_wallet(&repo);
}

#[test]
fn memory_list_returns_every_wallet() {
    list_returns_every_wallet(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_delete_removes_row_permanently() {
    let (_dir, repo) = common::sqlite_repo();
    delete_removes_row_permanently(&repo);
}

#[test]
fn memory_delete_removes_row_permanently() {
    delete_removes_row_permanently(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_operate_atomic_on_missing_wallet_skips_mutator() {
    let (_dir, repo) = common::sqlite_repo();
    operate_atomic_on_missing_wallet_skips_mutator(&repo);
}

#[test]
fn memory_operate_atomic_on_missing_wallet_skips_mutator() {
    operate_atomic_on_missing_wallet_skips_mutator(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_operate_atomic_writes_mutator_result() {
    let (_dir, repo) = common::sqlite_repo();
    operate_atomic_writes_mutator_result(&repo);
}

#[test]
fn memory_operate_atomic_writes_mutator_result() {
    operate_atomic_writes_mutator_result(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_operate_atomic_refuses_negative_balance() {
    let (_dir, repo) = common::sqlite_repo();
    operate_atomic_refuses_negative_balance(&repo);
}

#[test]
fn memory_operate_atomic_refuses_negative_balance() {
    operate_atomic_refuses_negative_balance(&MemoryWalletRepository::new());
}

#[test]
fn sqlite_wallets_survive_reopening_the_database() {
    let (dir, repo) = common::sqlite_repo();
    let wallet = repo.create_wallet().unwrap();
    repo.operate_atomic(wallet.id, |balance| Ok::<_, RepoError>(balance + 9))
        .unwrap();
    drop(repo);

    let config = wallet_core::PoolConfig::default();
    let pool = wallet_core::db::open_pool(common::db_path(&dir), &config).unwrap();
    let reopened = wallet_core::SqliteWalletRepository::new(pool);
    assert_eq!(reopened.get_wallet(wallet.id).unwrap().unwrap().balance, 9);
}
