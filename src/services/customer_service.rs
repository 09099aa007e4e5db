//! Customer service - customer lifecycle, account ownership and recipients.
//!
//! Accounts and recipients are changed through the owning `Customer`
//! aggregate and persisted by saving it: attaching sets the back-reference,
//! detaching clears it and lets the store drop the orphaned record.

use rust_decimal::Decimal;

use crate::{
    error::AppError,
    models::{Account, AccountId, Customer, CustomerId, Recipient, RecipientId},
    store::{StoreError, UnitOfWork},
};

/// Get customer by ID, with its accounts and recipients.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
pub async fn get_customer(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
) -> Result<Customer, AppError> {
    uow.find_customer(customer_id)
        .await?
        .ok_or(AppError::CustomerNotFound)
}

pub async fn list_customers(uow: &mut dyn UnitOfWork) -> Result<Vec<Customer>, AppError> {
    Ok(uow.find_all_customers().await?)
}

/// Create a customer, or update the profile of an existing one.
///
/// An update keeps the stored accounts and recipients; only the profile
/// fields are taken from `customer`.
///
/// # Errors
///
/// - `CustomerNotFound`: `customer.id` is set but unknown
pub async fn save_customer(
    uow: &mut dyn UnitOfWork,
    customer: Customer,
) -> Result<Customer, AppError> {
    let to_save = match customer.id {
        None => customer,
        Some(id) => {
            let mut stored = get_customer(uow, id).await?;
            stored.first_name = customer.first_name;
            stored.last_name = customer.last_name;
            stored.email = customer.email;
            stored.phone = customer.phone;
            stored
        }
    };

    let saved = uow.save_customer(to_save).await?;
    tracing::info!(customer_id = ?saved.id, "customer saved");
    Ok(saved)
}

/// Delete a customer that no longer owns any account.
///
/// Recipients do not block deletion; they are removed with the customer.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AssociationExists`: the customer still owns accounts
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn delete_customer(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
) -> Result<(), AppError> {
    let customer = get_customer(uow, customer_id).await?;

    if !customer.accounts().is_empty() {
        return Err(AppError::AssociationExists);
    }

    uow.delete_customer(customer_id).await?;
    tracing::info!("customer deleted");
    Ok(())
}

/// Sum of the balances of every account the customer owns.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `Storage(Corrupt)`: the total does not fit a decimal, which only stored
///   balances beyond `MAX_BALANCE` can cause
pub async fn get_balance(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
) -> Result<Decimal, AppError> {
    get_customer(uow, customer_id)
        .await?
        .total_balance()
        .ok_or_else(|| {
            StoreError::Corrupt(format!("customer {customer_id} balance total out of range")).into()
        })
}

/// Open an account for a customer.
///
/// `account` must be new (no id yet) and is normally straight from the
/// account factory, optionally credited with an initial amount.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `TransactionInvalid`: the account already has an id, or it is a
///   no-withdrawal account opened below its minimum balance
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn add_account(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
    account: Account,
) -> Result<Account, AppError> {
    let mut customer = get_customer(uow, customer_id).await?;

    if account.id.is_some() {
        return Err(AppError::TransactionInvalid);
    }

    if !account.can_withdraw() && account.balance() < account.kind.minimum_balance() {
        return Err(AppError::TransactionInvalid);
    }

    customer.add_account(account);
    let customer = uow.save_customer(customer).await?;

    let opened = customer
        .accounts()
        .last()
        .cloned()
        .ok_or(AppError::AccountNotFound)?;
    tracing::info!(account_id = ?opened.id, "account opened");
    Ok(opened)
}

/// Close one of a customer's accounts.
///
/// The balance must be exactly zero: money has to be withdrawn or
/// transferred out first.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: no such account, or owned by someone else
/// - `TransactionInvalid`: balance is not zero
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn close_account(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
    account_id: AccountId,
) -> Result<(), AppError> {
    let mut customer = get_customer(uow, customer_id).await?;

    let account = uow
        .find_account(account_id)
        .await?
        .ok_or(AppError::AccountNotFound)?;

    if !account.is_owned_by(customer_id) {
        return Err(AppError::AccountNotFound);
    }

    if account.balance() != Decimal::ZERO {
        return Err(AppError::TransactionInvalid);
    }

    customer
        .remove_account(account_id)
        .ok_or(AppError::AccountNotFound)?;
    uow.save_customer(customer).await?;

    tracing::info!("account closed");
    Ok(())
}

/// # Errors
///
/// - `CustomerNotFound`: no such customer
pub async fn list_recipients(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
) -> Result<Vec<Recipient>, AppError> {
    Ok(get_customer(uow, customer_id).await?.recipients().to_vec())
}

/// Register a new recipient for a customer, or update one they already have.
///
/// The account number must name an existing account that is not one of the
/// customer's own.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `AccountNotFound`: account number is unknown or is the customer's own
/// - `RecipientNotFound`: updating a recipient the customer does not have
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn add_recipient(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
    mut recipient: Recipient,
) -> Result<Recipient, AppError> {
    let mut customer = get_customer(uow, customer_id).await?;

    let target_exists = uow.find_account(recipient.account_number).await?.is_some();
    if !target_exists || customer.owns_account(recipient.account_number) {
        return Err(AppError::AccountNotFound);
    }

    match recipient.id {
        None => {
            customer.add_recipient(recipient);
            let customer = uow.save_customer(customer).await?;
            let added = customer
                .recipients()
                .last()
                .cloned()
                .ok_or(AppError::RecipientNotFound)?;
            tracing::info!(recipient_id = ?added.id, "recipient added");
            Ok(added)
        }
        Some(recipient_id) => {
            let stored = customer
                .recipient(recipient_id)
                .ok_or(AppError::RecipientNotFound)?;
            recipient.version = stored.version;

            if !customer.replace_recipient(recipient) {
                return Err(AppError::RecipientNotFound);
            }
            let customer = uow.save_customer(customer).await?;
            let updated = customer
                .recipient(recipient_id)
                .cloned()
                .ok_or(AppError::RecipientNotFound)?;
            tracing::info!("recipient updated");
            Ok(updated)
        }
    }
}

/// Remove one of a customer's recipients.
///
/// # Errors
///
/// - `CustomerNotFound`: no such customer
/// - `RecipientNotFound`: no such recipient, or it belongs to someone else
#[tracing::instrument(skip(uow), err(level = "warn"))]
pub async fn remove_recipient(
    uow: &mut dyn UnitOfWork,
    customer_id: CustomerId,
    recipient_id: RecipientId,
) -> Result<(), AppError> {
    let mut customer = get_customer(uow, customer_id).await?;

    let recipient = uow
        .find_recipient(recipient_id)
        .await?
        .ok_or(AppError::RecipientNotFound)?;

    if recipient.customer_id != Some(customer_id) {
        return Err(AppError::RecipientNotFound);
    }

    customer
        .remove_recipient(recipient_id)
        .ok_or(AppError::RecipientNotFound)?;
    uow.save_customer(customer).await?;

    tracing::info!("recipient removed");
    Ok(())
}
