//! Transfer service - moves money between two accounts.
//!
//! A transfer goes `Resolved -> Validated -> Applied -> Persisted`, leaving
//! for a rejection at the first failed check. The debit and the credit are
//! both written through the caller's unit of work, so they commit together
//! or not at all.

use crate::{
    error::AppError,
    models::{Account, AccountId, CustomerId, Transfer},
    store::UnitOfWork,
};

/// Accounts after a successful transfer.
#[derive(Debug, Clone)]
pub struct TransferReceipt {
    pub source: Account,
    pub destination: Account,
}

/// Execute a transfer between any two accounts.
///
/// No ownership rules apply; this form is for internal use.
///
/// # Errors
///
/// - `AccountNotFound`: either account does not exist
/// - `TransactionInvalid`: same account on both sides, source cannot be
///   debited by the amount, or destination cannot be credited by it
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn transfer(
    uow: &mut dyn UnitOfWork,
    transfer: Transfer,
) -> Result<TransferReceipt, AppError> {
    let (source, destination) = lock_pair(uow, &transfer).await?;
    let source = source.ok_or(AppError::AccountNotFound)?;
    let destination = destination.ok_or(AppError::AccountNotFound)?;

    apply(uow, source, destination, transfer).await
}

/// Execute a transfer on behalf of a customer.
///
/// The source must be one of the customer's accounts. The destination must
/// be one of their accounts or an account registered among their recipients.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: either account does not exist, the source is not the
///   customer's, or the destination is neither theirs nor a recipient
/// - `TransactionInvalid`: as for [`transfer`]
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn transfer_for_customer(
    uow: &mut dyn UnitOfWork,
    transfer: Transfer,
    customer_id: CustomerId,
) -> Result<TransferReceipt, AppError> {
    // Lock both accounts before the customer's own, so lock order never
    // depends on who is asking.
    let (source, destination) = lock_pair(uow, &transfer).await?;

    let customer = uow
        .find_customer(customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)?;

    let source = source.ok_or(AppError::AccountNotFound)?;
    let destination = destination.ok_or(AppError::AccountNotFound)?;

    if !customer.owns_account(transfer.source_id) {
        return Err(AppError::AccountNotFound);
    }

    if !customer.owns_account(transfer.destination_id)
        && !customer.has_recipient_account(transfer.destination_id)
    {
        return Err(AppError::AccountNotFound);
    }

    apply(uow, source, destination, transfer).await
}

/// Load source and destination in one ascending-id read.
async fn lock_pair(
    uow: &mut dyn UnitOfWork,
    transfer: &Transfer,
) -> Result<(Option<Account>, Option<Account>), AppError> {
    let accounts = uow
        .find_accounts(&[transfer.source_id, transfer.destination_id])
        .await?;
    let pick = |id: AccountId| accounts.iter().find(|a| a.id == Some(id)).cloned();

    Ok((pick(transfer.source_id), pick(transfer.destination_id)))
}

async fn apply(
    uow: &mut dyn UnitOfWork,
    mut source: Account,
    mut destination: Account,
    transfer: Transfer,
) -> Result<TransferReceipt, AppError> {
    if transfer.source_id == transfer.destination_id {
        return Err(AppError::TransactionInvalid);
    }

    if !source.can_debit(transfer.amount) || !destination.can_credit(transfer.amount) {
        return Err(AppError::TransactionInvalid);
    }

    source.debit(transfer.amount);
    destination.credit(transfer.amount);

    let source = uow.save_account(source).await?;
    let destination = uow.save_account(destination).await?;

    tracing::info!(
        source_balance = %source.balance(),
        destination_balance = %destination.balance(),
        "transfer applied"
    );
    Ok(TransferReceipt {
        source,
        destination,
    })
}
