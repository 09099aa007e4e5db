//! Transaction HTTP handlers.
//!
//! - POST /api/customers/{cid}/accounts/{aid}/deposit - Add money to an account
//! - POST /api/customers/{cid}/accounts/{aid}/withdraw - Take money out of an account
//! - POST /api/customers/{cid}/transfers - Move money to an own account or a recipient

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    error::AppError,
    models::{
        AccountId, CustomerId, Transfer,
        account::{AccountResponse, AmountRequest},
    },
    routes::AppState,
    services::{account_service, transfer_service},
};

/// Deposit into an account.
///
/// # Request Body
///
/// ```json
/// { "amount": "50.00" }
/// ```
///
/// # Response (200)
///
/// The account after the deposit.
pub async fn deposit(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(CustomerId, AccountId)>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let account =
        account_service::deposit(&mut *uow, account_id, customer_id, request.amount).await?;
    uow.commit().await?;

    Ok(Json(account.into()))
}

/// Withdraw from an account.
///
/// # Validation
///
/// - Account must allow withdrawals (savings does not)
/// - Account must have sufficient balance
pub async fn withdraw(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(CustomerId, AccountId)>,
    Json(request): Json<AmountRequest>,
) -> Result<Json<AccountResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let account =
        account_service::withdraw(&mut *uow, account_id, customer_id, request.amount).await?;
    uow.commit().await?;

    Ok(Json(account.into()))
}

/// Transfer money on behalf of a customer.
///
/// # Atomicity
///
/// Both accounts are updated in a single unit of work.
/// Either both succeed or both fail.
///
/// # Response (200)
///
/// The source account after the transfer. The destination may belong to
/// someone else, so it is not returned.
pub async fn transfer(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(request): Json<Transfer>,
) -> Result<Json<AccountResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let receipt = transfer_service::transfer_for_customer(&mut *uow, request, customer_id).await?;
    uow.commit().await?;

    Ok(Json(receipt.source.into()))
}
