//! Account service - deposits and withdrawals against a single account.
//!
//! Every operation runs inside the caller's unit of work and only writes
//! through it, so a failure anywhere leaves stored state untouched once the
//! unit of work is dropped.
//!
//! # Check Order
//!
//! 1. Customer exists
//! 2. Account exists
//! 3. Account belongs to the customer (reported as `AccountNotFound`)
//! 4. Amount and balance rules
//!
//! Ownership is checked before amounts, so a caller can never tell a foreign
//! account from a missing one, but can always tell both from a bad amount.

use rust_decimal::Decimal;

use crate::{
    error::AppError,
    models::{Account, AccountId, CustomerId},
    store::UnitOfWork,
};

/// Get account by ID.
///
/// # Errors
///
/// - `AccountNotFound`: no such account
pub async fn get_account(uow: &mut dyn UnitOfWork, account_id: AccountId) -> Result<Account, AppError> {
    uow.find_account(account_id)
        .await?
        .ok_or(AppError::AccountNotFound)
}

/// Get an account on behalf of the customer that owns it.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: no such account, or owned by someone else
pub async fn get_owned_account(
    uow: &mut dyn UnitOfWork,
    account_id: AccountId,
    customer_id: CustomerId,
) -> Result<Account, AppError> {
    uow.find_customer(customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let account = get_account(uow, account_id).await?;
    if !account.is_owned_by(customer_id) {
        return Err(AppError::AccountNotFound);
    }
    Ok(account)
}

/// Deposit money into a customer's account.
///
/// # Process
///
/// 1. Resolve customer and account, verify ownership
/// 2. Check the amount can be credited
/// 3. Credit and save the account
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: no such account, or owned by someone else
/// - `TransactionInvalid`: amount is zero or negative
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn deposit(
    uow: &mut dyn UnitOfWork,
    account_id: AccountId,
    customer_id: CustomerId,
    amount: Decimal,
) -> Result<Account, AppError> {
    let mut account = get_owned_account(uow, account_id, customer_id).await?;

    if !account.can_credit(amount) {
        return Err(AppError::TransactionInvalid);
    }

    account.credit(amount);
    let account = uow.save_account(account).await?;

    tracing::info!(balance = %account.balance(), "deposit applied");
    Ok(account)
}

/// Withdraw money from a customer's account.
///
/// Only kinds that allow direct withdrawal qualify; savings accounts can
/// only be emptied by transfer.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: no such account, or owned by someone else
/// - `TransactionInvalid`: account kind forbids withdrawal, amount is not
///   positive, or the balance (or its floor) does not cover it
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn withdraw(
    uow: &mut dyn UnitOfWork,
    account_id: AccountId,
    customer_id: CustomerId,
    amount: Decimal,
) -> Result<Account, AppError> {
    let mut account = get_owned_account(uow, account_id, customer_id).await?;

    if !account.can_withdraw() {
        return Err(AppError::TransactionInvalid);
    }

    if !account.can_debit(amount) {
        return Err(AppError::TransactionInvalid);
    }

    account.debit(amount);
    let account = uow.save_account(account).await?;

    tracing::info!(balance = %account.balance(), "withdrawal applied");
    Ok(account)
}
