//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use bank_ledger::{
    factory,
    models::{Account, AccountId, AccountKind, Customer, CustomerId, Recipient},
    services::customer_service,
    store::{MemoryStore, Store, UnitOfWork},
};
use rust_decimal::Decimal;

pub async fn customer(store: &MemoryStore, first_name: &str) -> CustomerId {
    let mut uow = store.begin().await.unwrap();
    let customer = customer_service::save_customer(
        uow.as_mut(),
        Customer::new(first_name, "Tester", format!("{first_name}@example.com"), "555"),
    )
    .await
    .unwrap();
    uow.commit().await.unwrap();
    customer.id.unwrap()
}

pub async fn account(
    store: &MemoryStore,
    customer_id: CustomerId,
    kind: AccountKind,
    balance: Decimal,
) -> AccountId {
    let mut account = factory::create_account(kind);
    account.credit(balance);

    let mut uow = store.begin().await.unwrap();
    let account = customer_service::add_account(uow.as_mut(), customer_id, account)
        .await
        .unwrap();
    uow.commit().await.unwrap();
    account.id.unwrap()
}

pub async fn recipient(store: &MemoryStore, customer_id: CustomerId, target: AccountId) {
    let mut uow = store.begin().await.unwrap();
    customer_service::add_recipient(uow.as_mut(), customer_id, Recipient::new("Payee", target))
        .await
        .unwrap();
    uow.commit().await.unwrap();
}

pub async fn load_account(store: &MemoryStore, account_id: AccountId) -> Option<Account> {
    let mut uow = store.begin().await.unwrap();
    uow.find_account(account_id).await.unwrap()
}

pub async fn balance_of(store: &MemoryStore, account_id: AccountId) -> Decimal {
    load_account(store, account_id).await.unwrap().balance()
}

pub async fn load_customer(store: &MemoryStore, customer_id: CustomerId) -> Option<Customer> {
    let mut uow = store.begin().await.unwrap();
    uow.find_customer(customer_id).await.unwrap()
}
