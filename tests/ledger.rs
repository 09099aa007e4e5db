//! Ledger behaviour through the services, on the in-memory store.

mod common;

use bank_ledger::{
    error::AppError,
    factory,
    models::{
        Account, AccountId, AccountKind, CustomerId, MAX_BALANCE, Recipient, RecipientId, Transfer,
    },
    services::{account_service, customer_service, transfer_service},
    store::{MemoryStore, Store, StoreError, UnitOfWork},
};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

// Concrete scenarios

#[tokio::test]
async fn deposit_into_empty_checking() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let account = account_service::deposit(uow.as_mut(), checking, c, dec!(50))
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(account.balance(), dec!(50));
    assert_eq!(common::balance_of(&store, checking).await, dec!(50));
}

#[tokio::test]
async fn savings_forbids_direct_withdrawal() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let savings = common::account(&store, c, AccountKind::Savings, dec!(100)).await;

    let mut uow = store.begin().await.unwrap();
    let err = account_service::withdraw(uow.as_mut(), savings, c, dec!(10))
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::TransactionInvalid));
    assert_eq!(common::balance_of(&store, savings).await, dec!(100));
}

#[tokio::test]
async fn customer_transfer_to_registered_recipient() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let payee = common::customer(&store, "pete").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(150)).await;
    let destination = common::account(&store, payee, AccountKind::Checking, dec!(0)).await;
    common::recipient(&store, c, destination).await;

    let mut uow = store.begin().await.unwrap();
    let receipt = transfer_service::transfer_for_customer(
        uow.as_mut(),
        Transfer::new(source, destination, dec!(100)),
        c,
    )
    .await
    .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(receipt.source.balance(), dec!(50));
    assert_eq!(receipt.destination.balance(), dec!(100));
    assert_eq!(common::balance_of(&store, source).await, dec!(50));
    assert_eq!(common::balance_of(&store, destination).await, dec!(100));
}

#[tokio::test]
async fn unrestricted_transfer_beyond_balance_is_rejected() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(150)).await;
    let destination = common::account(&store, d, AccountKind::Checking, dec!(20)).await;

    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer(uow.as_mut(), Transfer::new(source, destination, dec!(200)))
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::TransactionInvalid));
    assert_eq!(common::balance_of(&store, source).await, dec!(150));
    assert_eq!(common::balance_of(&store, destination).await, dec!(20));
}

#[tokio::test]
async fn closing_empty_checking_detaches_it() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    customer_service::close_account(uow.as_mut(), c, checking)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let customer = common::load_customer(&store, c).await.unwrap();
    assert!(!customer.owns_account(checking));
    assert!(common::load_account(&store, checking).await.is_none());
}

#[tokio::test]
async fn closing_funded_checking_is_rejected() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(5)).await;

    let mut uow = store.begin().await.unwrap();
    let err = customer_service::close_account(uow.as_mut(), c, checking)
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::TransactionInvalid));
    let customer = common::load_customer(&store, c).await.unwrap();
    assert!(customer.owns_account(checking));
    assert_eq!(common::balance_of(&store, checking).await, dec!(5));
}

#[tokio::test]
async fn customer_with_accounts_cannot_be_deleted() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let err = customer_service::delete_customer(uow.as_mut(), c)
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::AssociationExists));
    assert!(common::load_customer(&store, c).await.is_some());
}

// Boundaries

#[rstest]
#[case::down_to_floor(dec!(50), true)]
#[case::below_floor(dec!(50.01), false)]
#[tokio::test]
async fn savings_debit_stops_at_minimum_balance(#[case] amount: Decimal, #[case] succeeds: bool) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let savings = common::account(&store, c, AccountKind::Savings, dec!(150)).await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let result =
        transfer_service::transfer_for_customer(uow.as_mut(), Transfer::new(savings, checking, amount), c)
            .await;

    if succeeds {
        result.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(common::balance_of(&store, savings).await, dec!(100));
    } else {
        assert!(matches!(result, Err(AppError::TransactionInvalid)));
        drop(uow);
        assert_eq!(common::balance_of(&store, savings).await, dec!(150));
    }
}

#[rstest]
#[case::zero(dec!(0.00), true)]
#[case::one_cent(dec!(0.01), false)]
#[tokio::test]
async fn only_zero_balance_accounts_close(#[case] balance: Decimal, #[case] succeeds: bool) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, balance).await;

    let mut uow = store.begin().await.unwrap();
    let result = customer_service::close_account(uow.as_mut(), c, checking).await;

    assert_eq!(result.is_ok(), succeeds);
    if !succeeds {
        assert!(matches!(result, Err(AppError::TransactionInvalid)));
    }
}

#[rstest]
#[case::at_minimum(dec!(100), true)]
#[case::under_minimum(dec!(99.99), false)]
#[tokio::test]
async fn savings_opening_balance_floor(#[case] initial: Decimal, #[case] succeeds: bool) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let mut account = factory::create_account(AccountKind::Savings);
    account.credit(initial);

    let mut uow = store.begin().await.unwrap();
    let result = customer_service::add_account(uow.as_mut(), c, account).await;

    assert_eq!(result.is_ok(), succeeds);
    if !succeeds {
        assert!(matches!(result, Err(AppError::TransactionInvalid)));
    }
}

#[rstest]
#[case::zero(dec!(0))]
#[case::negative(dec!(-5))]
#[tokio::test]
async fn non_positive_amounts_are_rejected(#[case] amount: Decimal) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(10)).await;

    let mut uow = store.begin().await.unwrap();
    let deposit = account_service::deposit(uow.as_mut(), checking, c, amount).await;
    let withdraw = account_service::withdraw(uow.as_mut(), checking, c, amount).await;
    drop(uow);

    assert!(matches!(deposit, Err(AppError::TransactionInvalid)));
    assert!(matches!(withdraw, Err(AppError::TransactionInvalid)));
    assert_eq!(common::balance_of(&store, checking).await, dec!(10));
}

#[tokio::test]
async fn checking_withdrawal_cannot_overdraw() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(30)).await;

    let mut uow = store.begin().await.unwrap();
    let err = account_service::withdraw(uow.as_mut(), checking, c, dec!(30.01))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::TransactionInvalid));

    let account = account_service::withdraw(uow.as_mut(), checking, c, dec!(30))
        .await
        .unwrap();
    uow.commit().await.unwrap();
    assert_eq!(account.balance(), dec!(0));
}

// Ownership and resolution

#[tokio::test]
async fn foreign_account_looks_like_missing_account() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let theirs = common::account(&store, d, AccountKind::Checking, dec!(40)).await;

    let mut uow = store.begin().await.unwrap();
    let foreign = account_service::deposit(uow.as_mut(), theirs, c, dec!(1)).await;
    let missing = account_service::deposit(uow.as_mut(), AccountId(9_999), c, dec!(1)).await;
    drop(uow);

    assert!(matches!(foreign, Err(AppError::AccountNotFound)));
    assert!(matches!(missing, Err(AppError::AccountNotFound)));
    assert_eq!(common::balance_of(&store, theirs).await, dec!(40));
}

#[tokio::test]
async fn unknown_customer_is_reported_before_account() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(10)).await;

    let mut uow = store.begin().await.unwrap();
    let err = account_service::withdraw(uow.as_mut(), checking, CustomerId(9_999), dec!(1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CustomerNotFound));
}

#[tokio::test]
async fn ownership_is_checked_before_amount() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let theirs = common::account(&store, d, AccountKind::Checking, dec!(10)).await;

    let mut uow = store.begin().await.unwrap();
    let err = account_service::withdraw(uow.as_mut(), theirs, c, dec!(-1))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound));
}

#[tokio::test]
async fn transfer_to_unregistered_foreign_account_is_refused() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(100)).await;
    let stranger = common::account(&store, d, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer_for_customer(
        uow.as_mut(),
        Transfer::new(source, stranger, dec!(10)),
        c,
    )
    .await
    .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::AccountNotFound));
    assert_eq!(common::balance_of(&store, source).await, dec!(100));
}

#[tokio::test]
async fn transfer_from_foreign_source_is_refused() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let mine = common::account(&store, c, AccountKind::Checking, dec!(0)).await;
    let theirs = common::account(&store, d, AccountKind::Checking, dec!(100)).await;

    let mut uow = store.begin().await.unwrap();
    let err =
        transfer_service::transfer_for_customer(uow.as_mut(), Transfer::new(theirs, mine, dec!(10)), c)
            .await
            .unwrap_err();

    assert!(matches!(err, AppError::AccountNotFound));
}

#[tokio::test]
async fn transfer_between_own_accounts() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(80)).await;
    let savings = common::account(&store, c, AccountKind::Savings, dec!(100)).await;

    let mut uow = store.begin().await.unwrap();
    transfer_service::transfer_for_customer(uow.as_mut(), Transfer::new(checking, savings, dec!(30)), c)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(common::balance_of(&store, checking).await, dec!(50));
    assert_eq!(common::balance_of(&store, savings).await, dec!(130));
}

#[tokio::test]
async fn transfer_to_same_account_is_invalid() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(80)).await;

    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer(uow.as_mut(), Transfer::new(checking, checking, dec!(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TransactionInvalid));
}

#[rstest]
#[case(dec!(0.01))]
#[case(dec!(12.34))]
#[case(dec!(149.99))]
#[case(dec!(150))]
#[tokio::test]
async fn transfers_conserve_money(#[case] amount: Decimal) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(150)).await;
    let destination = common::account(&store, c, AccountKind::Checking, dec!(25)).await;

    let mut uow = store.begin().await.unwrap();
    transfer_service::transfer(uow.as_mut(), Transfer::new(source, destination, amount))
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let after_source = common::balance_of(&store, source).await;
    let after_destination = common::balance_of(&store, destination).await;
    assert_eq!(after_source, dec!(150) - amount);
    assert_eq!(after_destination, dec!(25) + amount);
    assert_eq!(after_source + after_destination, dec!(175));
}

// Atomicity

#[tokio::test]
async fn storage_failure_between_debit_and_credit_changes_nothing() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(150)).await;
    let destination = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    // Source save goes through, destination save fails.
    store.fail_saves_after(1);
    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer(uow.as_mut(), Transfer::new(source, destination, dec!(100)))
        .await
        .unwrap_err();
    drop(uow);
    store.stop_failing();

    assert!(matches!(err, AppError::Storage(StoreError::Unavailable)));
    assert_eq!(common::balance_of(&store, source).await, dec!(150));
    assert_eq!(common::balance_of(&store, destination).await, dec!(0));
}

#[tokio::test]
async fn storage_failure_while_closing_keeps_account_attached() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    store.fail_saves_after(0);
    let mut uow = store.begin().await.unwrap();
    let err = customer_service::close_account(uow.as_mut(), c, checking)
        .await
        .unwrap_err();
    drop(uow);
    store.stop_failing();

    assert!(matches!(err, AppError::Storage(StoreError::Unavailable)));
    assert!(common::load_customer(&store, c).await.unwrap().owns_account(checking));
    assert!(common::load_account(&store, checking).await.is_some());
}

#[tokio::test]
async fn storage_failure_during_deposit_leaves_balance() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(10)).await;

    store.fail_saves_after(0);
    let mut uow = store.begin().await.unwrap();
    let result = account_service::deposit(uow.as_mut(), checking, c, dec!(5)).await;
    drop(uow);
    store.stop_failing();

    assert!(result.is_err());
    assert_eq!(common::balance_of(&store, checking).await, dec!(10));
}

#[tokio::test]
async fn concurrent_deposits_surface_a_conflict() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(10)).await;

    let mut first = store.begin().await.unwrap();
    let mut second = store.begin().await.unwrap();
    account_service::deposit(first.as_mut(), checking, c, dec!(1))
        .await
        .unwrap();
    account_service::deposit(second.as_mut(), checking, c, dec!(2))
        .await
        .unwrap();

    first.commit().await.unwrap();
    let err = second.commit().await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict));
    assert_eq!(common::balance_of(&store, checking).await, dec!(11));

    // Retrying is up to the caller.
    let mut retry = store.begin().await.unwrap();
    account_service::deposit(retry.as_mut(), checking, c, dec!(2))
        .await
        .unwrap();
    retry.commit().await.unwrap();
    assert_eq!(common::balance_of(&store, checking).await, dec!(13));
}

// Customers and recipients

#[tokio::test]
async fn customer_with_only_recipients_can_be_deleted() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let theirs = common::account(&store, d, AccountKind::Checking, dec!(0)).await;
    common::recipient(&store, c, theirs).await;

    let mut uow = store.begin().await.unwrap();
    customer_service::delete_customer(uow.as_mut(), c)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert!(common::load_customer(&store, c).await.is_none());
    let mut uow = store.begin().await.unwrap();
    assert!(uow.find_all_recipients().await.unwrap().is_empty());
}

#[tokio::test]
async fn deleting_unknown_customer_fails() {
    let store = MemoryStore::new();

    let mut uow = store.begin().await.unwrap();
    let err = customer_service::delete_customer(uow.as_mut(), CustomerId(42))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::CustomerNotFound));
}

#[tokio::test]
async fn balance_sums_every_account() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    common::account(&store, c, AccountKind::Checking, dec!(12.50)).await;
    common::account(&store, c, AccountKind::Savings, dec!(100.25)).await;

    let mut uow = store.begin().await.unwrap();
    let balance = customer_service::get_balance(uow.as_mut(), c).await.unwrap();

    assert_eq!(balance, dec!(112.75));
}

#[tokio::test]
async fn recipient_cannot_point_at_own_or_missing_account() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let mine = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let own = customer_service::add_recipient(uow.as_mut(), c, Recipient::new("Me", mine)).await;
    let missing =
        customer_service::add_recipient(uow.as_mut(), c, Recipient::new("Ghost", AccountId(9_999)))
            .await;

    assert!(matches!(own, Err(AppError::AccountNotFound)));
    assert!(matches!(missing, Err(AppError::AccountNotFound)));
}

#[tokio::test]
async fn recipients_are_private_to_their_customer() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let target = common::account(&store, d, AccountKind::Checking, dec!(0)).await;
    common::recipient(&store, c, target).await;

    let mut uow = store.begin().await.unwrap();
    let recipient_id = customer_service::list_recipients(uow.as_mut(), c).await.unwrap()[0]
        .id
        .unwrap();

    let err = customer_service::remove_recipient(uow.as_mut(), d, recipient_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RecipientNotFound));

    let err = customer_service::remove_recipient(uow.as_mut(), c, RecipientId(9_999))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RecipientNotFound));

    customer_service::remove_recipient(uow.as_mut(), c, recipient_id)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    let mut uow = store.begin().await.unwrap();
    assert!(customer_service::list_recipients(uow.as_mut(), c)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn updating_a_recipient_keeps_its_identity() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let target = common::account(&store, d, AccountKind::Checking, dec!(0)).await;
    common::recipient(&store, c, target).await;

    let mut uow = store.begin().await.unwrap();
    let mut recipient = customer_service::list_recipients(uow.as_mut(), c).await.unwrap()[0].clone();
    let recipient_id = recipient.id.unwrap();
    recipient.description = "Rent".to_string();

    let updated = customer_service::add_recipient(uow.as_mut(), c, recipient)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(updated.id, Some(recipient_id));
    assert_eq!(updated.description, "Rent");
    assert_eq!(updated.customer_id, Some(c));

    let mut uow = store.begin().await.unwrap();
    let recipients = customer_service::list_recipients(uow.as_mut(), c).await.unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0].description, "Rent");
}

#[tokio::test]
async fn profile_update_keeps_accounts() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(7)).await;

    let mut profile = bank_ledger::models::Customer::new("Carol", "Renamed", "new@example.com", "1");
    profile.id = Some(c);

    let mut uow = store.begin().await.unwrap();
    let saved = customer_service::save_customer(uow.as_mut(), profile)
        .await
        .unwrap();
    uow.commit().await.unwrap();

    assert_eq!(saved.last_name, "Renamed");
    assert!(saved.owns_account(checking));
    assert_eq!(common::balance_of(&store, checking).await, dec!(7));
}

#[tokio::test]
async fn accounts_with_an_id_cannot_be_added_again() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(7)).await;

    let account = common::load_account(&store, checking).await.unwrap();
    let mut uow = store.begin().await.unwrap();
    let err = customer_service::add_account(uow.as_mut(), d, account)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::TransactionInvalid));
}

// Rejections that must leave balances alone

#[tokio::test]
async fn closing_a_foreign_or_missing_account_is_not_found() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let theirs = common::account(&store, d, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let foreign = customer_service::close_account(uow.as_mut(), c, theirs).await;
    let missing = customer_service::close_account(uow.as_mut(), c, AccountId(9_999)).await;
    drop(uow);

    assert!(matches!(foreign, Err(AppError::AccountNotFound)));
    assert!(matches!(missing, Err(AppError::AccountNotFound)));
    assert!(common::load_customer(&store, d).await.unwrap().owns_account(theirs));
}

#[rstest]
#[case::missing_source(true)]
#[case::missing_destination(false)]
#[tokio::test]
async fn unrestricted_transfer_with_missing_account(#[case] source_missing: bool) {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let existing = common::account(&store, c, AccountKind::Checking, dec!(60)).await;
    let missing = AccountId(9_999);

    let transfer = if source_missing {
        Transfer::new(missing, existing, dec!(10))
    } else {
        Transfer::new(existing, missing, dec!(10))
    };

    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer(uow.as_mut(), transfer)
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::AccountNotFound));
    assert_eq!(common::balance_of(&store, existing).await, dec!(60));
}

#[tokio::test]
async fn customer_transfer_by_unknown_customer() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(60)).await;
    let destination = common::account(&store, c, AccountKind::Checking, dec!(0)).await;

    let mut uow = store.begin().await.unwrap();
    let err = transfer_service::transfer_for_customer(
        uow.as_mut(),
        Transfer::new(source, destination, dec!(10)),
        CustomerId(9_999),
    )
    .await
    .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::CustomerNotFound));
    assert_eq!(common::balance_of(&store, source).await, dec!(60));
    assert_eq!(common::balance_of(&store, destination).await, dec!(0));
}

#[tokio::test]
async fn updating_someone_elses_recipient_is_not_found() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let d = common::customer(&store, "dave").await;
    let e = common::customer(&store, "erin").await;
    let target = common::account(&store, e, AccountKind::Checking, dec!(0)).await;
    common::recipient(&store, d, target).await;

    let mut uow = store.begin().await.unwrap();
    let mut daves = customer_service::list_recipients(uow.as_mut(), d).await.unwrap()[0].clone();
    daves.name = "Hijacked".to_string();

    let err = customer_service::add_recipient(uow.as_mut(), c, daves)
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::RecipientNotFound));
    let mut uow = store.begin().await.unwrap();
    let recipients = customer_service::list_recipients(uow.as_mut(), d).await.unwrap();
    assert_eq!(recipients[0].name, "Payee");
    assert!(customer_service::list_recipients(uow.as_mut(), c)
        .await
        .unwrap()
        .is_empty());
}

// Balance range

#[tokio::test]
async fn deposit_past_the_balance_limit_is_invalid() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, MAX_BALANCE).await;

    let mut uow = store.begin().await.unwrap();
    let err = account_service::deposit(uow.as_mut(), checking, c, dec!(1))
        .await
        .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::TransactionInvalid));
    assert_eq!(common::balance_of(&store, checking).await, MAX_BALANCE);
}

#[tokio::test]
async fn transfer_into_a_full_account_is_invalid() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let source = common::account(&store, c, AccountKind::Checking, dec!(10)).await;
    let full = common::account(&store, c, AccountKind::Checking, MAX_BALANCE).await;

    let mut uow = store.begin().await.unwrap();
    let err =
        transfer_service::transfer_for_customer(uow.as_mut(), Transfer::new(source, full, dec!(5)), c)
            .await
            .unwrap_err();
    drop(uow);

    assert!(matches!(err, AppError::TransactionInvalid));
    assert_eq!(common::balance_of(&store, source).await, dec!(10));
    assert_eq!(common::balance_of(&store, full).await, MAX_BALANCE);
}

#[tokio::test]
async fn balance_of_accounts_at_the_limit_is_exact() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    common::account(&store, c, AccountKind::Checking, MAX_BALANCE).await;
    common::account(&store, c, AccountKind::Checking, MAX_BALANCE).await;

    let mut uow = store.begin().await.unwrap();
    let balance = customer_service::get_balance(uow.as_mut(), c).await.unwrap();

    assert_eq!(balance, MAX_BALANCE + MAX_BALANCE);
}

#[tokio::test]
async fn sub_cent_amounts_are_invalid() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    let checking = common::account(&store, c, AccountKind::Checking, dec!(10)).await;

    let mut uow = store.begin().await.unwrap();
    let deposit = account_service::deposit(uow.as_mut(), checking, c, dec!(0.005)).await;
    let withdraw = account_service::withdraw(uow.as_mut(), checking, c, dec!(1.001)).await;
    drop(uow);

    assert!(matches!(deposit, Err(AppError::TransactionInvalid)));
    assert!(matches!(withdraw, Err(AppError::TransactionInvalid)));
    assert_eq!(common::balance_of(&store, checking).await, dec!(10));
}

#[tokio::test]
async fn out_of_range_stored_balances_do_not_panic() {
    let store = MemoryStore::new();
    let c = common::customer(&store, "carol").await;
    for _ in 0..2 {
        let id = common::account(&store, c, AccountKind::Checking, dec!(0)).await;
        let stored = common::load_account(&store, id).await.unwrap();

        let mut uow = store.begin().await.unwrap();
        uow.save_account(Account::from_parts(
            id,
            stored.kind,
            Decimal::MAX,
            stored.customer_id,
            stored.version,
        ))
        .await
        .unwrap();
        uow.commit().await.unwrap();
    }

    let mut uow = store.begin().await.unwrap();
    let balance = customer_service::get_balance(uow.as_mut(), c).await;

    assert!(matches!(balance, Err(AppError::Storage(StoreError::Corrupt(_)))));
}
