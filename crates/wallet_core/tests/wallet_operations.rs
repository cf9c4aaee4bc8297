mod common;

use wallet_core::{RepoError, WalletRepository, WalletService, WalletServiceError};

type Service<R> = WalletService<R>;

fn deposit_then_withdraw<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();

    let after_deposit = service.operation(wallet.id, "DEPOSIT", 100).unwrap();
    assert_eq!(after_deposit.id, wallet.id);
    assert_eq!(after_deposit.balance, 100);

    let after_withdraw = service.operation(wallet.id, "WITHDRAW", 30).unwrap();
    assert_eq!(after_withdraw.balance, 70);
    assert_eq!(service.amount(wallet.id).unwrap(), 70);
}

fn overdraft_is_rejected_and_balance_kept<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 30).unwrap();

    let err = service.withdraw(wallet.id, 50).unwrap_err();
    assert!(matches!(
        err,
        WalletServiceError::InsufficientFunds {
            balance: 30,
            requested: 50
        }
    ));
    assert_eq!(service.amount(wallet.id).unwrap(), 30);
}

fn invalid_kind_is_rejected_and_balance_kept<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 15).unwrap();

    let err = service.operation(wallet.id, "HELLO", 10).unwrap_err();
    assert!(matches!(err, WalletServiceError::InvalidOperationKind(ref kind) if kind == "HELLO"));
    assert_eq!(service.amount(wallet.id).unwrap(), 15);
}

fn non_positive_amounts_are_rejected<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();

    for amount in [0, -1, i64::MIN] {
        let err = service.operation(wallet.id, "DEPOSIT", amount).unwrap_err();
        assert!(matches!(err, WalletServiceError::InvalidAmount(value) if value == amount));
    }

    // Amount is validated before the wallet is looked up.
    let err = service.withdraw(uuid::Uuid::new_v4(), 0).unwrap_err();
    assert!(matches!(err, WalletServiceError::InvalidAmount(0)));
    assert_eq!(service.amount(wallet.id).unwrap(), 0);
}

fn overflow_is_rejected_and_balance_kept<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, i64::MAX).unwrap();

    let err = service.deposit(wallet.id, 1).unwrap_err();
    assert!(matches!(
        err,
        WalletServiceError::Overflow {
            balance: i64::MAX,
            amount: 1
        }
    ));
    assert_eq!(service.amount(wallet.id).unwrap(), i64::MAX);

    // Ceiling is reachable, not exceeded.
    service.withdraw(wallet.id, 1).unwrap();
    assert_eq!(service.deposit(wallet.id, 1).unwrap().balance, i64::MAX);
}

fn unknown_and_deleted_wallets_are_not_found<R: WalletRepository>(service: &Service<R>) {
    let never_created = uuid::Uuid::new_v4();
    assert!(matches!(
        service.amount(never_created),
        Err(WalletServiceError::NotFound(id)) if id == never_created
    ));
    assert!(matches!(
        service.delete(never_created),
        Err(WalletServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.operation(never_created, "DEPOSIT", 5),
        Err(WalletServiceError::NotFound(_))
    ));

    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 5).unwrap();
    service.delete(wallet.id).unwrap();

    assert!(matches!(
        service.amount(wallet.id),
        Err(WalletServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.withdraw(wallet.id, 1),
        Err(WalletServiceError::NotFound(_))
    ));
    assert!(matches!(
        service.delete(wallet.id),
        Err(WalletServiceError::NotFound(_))
    ));
    assert!(service.list().unwrap().iter().all(|w| w.id != wallet.id));
}

fn repeated_reads_are_stable<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 42).unwrap();

    let readings: Vec<i64> = (0..10)
        .map(|_| service.amount(wallet.id).unwrap())
        .collect();
    assert!(readings.iter().all(|value| *value == 42));
}

fn failing_mutator_commits_nothing<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 10).unwrap();

    let reject = |_: i64| Err::<i64, _>(RepoError::InvalidData("rejected".into()));
    let err = service
        .repository()
        .operate_atomic(wallet.id, reject)
        .unwrap_err();
    assert!(matches!(err, RepoError::InvalidData(ref message) if message == "rejected"));
    assert_eq!(service.amount(wallet.id).unwrap(), 10);
}

fn panicking_mutator_commits_nothing<R: WalletRepository>(service: &Service<R>) {
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 10).unwrap();

    let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        service
            .repository()
            .operate_atomic(wallet.id, |_| -> Result<i64, RepoError> {
                panic!("mutator aborted mid-transaction")
            })
    }));
    assert!(outcome.is_err());

    assert_eq!(service.amount(wallet.id).unwrap(), 10);
    // The row lock was released by the unwind.
    assert_eq!(service.deposit(wallet.id, 1).unwrap().balance, 11);
}

macro_rules! backend_tests {
    ($($name:ident),* $(,)?) => {
        mod sqlite {
            $(
                #[test]
                fn $name() {
                    let (_dir, service) = crate::common::sqlite_service();
                    super::$name(&service);
                }
            )*
        }

        mod memory {
            $(
                #[test]
                fn $name() {
                    let service = crate::common::memory_service();
                    super::$name(&service);
                }
            )*
        }
    };
}

backend_tests!(
    deposit_then_withdraw,
    overdraft_is_rejected_and_balance_kept,
    invalid_kind_is_rejected_and_balance_kept,
    non_positive_amounts_are_rejected,
    overflow_is_rejected_and_balance_kept,
    unknown_and_deleted_wallets_are_not_found,
    repeated_reads_are_stable,
    failing_mutator_commits_nothing,
    panicking_mutator_commits_nothing,
);

#[test]
fn storage_failure_leaves_balance_unchanged_and_is_retryable() {
    let (_dir, repo) = common::sqlite_repo_with(common::short_busy_timeout());
    let service = WalletService::new(repo);
    let wallet = service.create().unwrap();
    service.deposit(wallet.id, 20).unwrap();

    let (locked_tx, locked_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let service = &service;

    std::thread::scope(|scope| {
        let holder = scope.spawn(move || {
            service
                .repository()
                .operate_atomic(wallet.id, move |balance| {
                    locked_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                    Ok::<_, RepoError>(balance)
                })
        });
        locked_rx.recv().unwrap();

        let err = service.deposit(wallet.id, 5).unwrap_err();
        match err {
            WalletServiceError::Storage(ref inner) => assert!(inner.is_storage_failure()),
            other => panic!("expected storage failure, got {other}"),
        }
        assert_eq!(err.code(), "storage_failure");

        release_tx.send(()).unwrap();
        holder.join().unwrap().unwrap();
    });

    assert_eq!(service.amount(wallet.id).unwrap(), 20);
    assert_eq!(service.deposit(wallet.id, 5).unwrap().balance, 25);
}
