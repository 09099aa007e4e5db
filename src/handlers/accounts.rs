//! Account HTTP handlers.
//!
//! - GET    /api/customers/{cid}/accounts - List the customer's accounts
//! - POST   /api/customers/{cid}/accounts - Open a new account
//! - GET    /api/customers/{cid}/accounts/{aid} - Get one of the customer's accounts
//! - DELETE /api/customers/{cid}/accounts/{aid} - Close an empty account

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    factory,
    models::{
        AccountId, CustomerId,
        account::{AccountResponse, OpenAccountRequest},
    },
    routes::AppState,
    services::{account_service, customer_service},
};

pub async fn list_accounts(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<AccountResponse>>, AppError> {
    let mut uow = state.store.begin().await?;
    let customer = customer_service::get_customer(&mut *uow, customer_id).await?;
    uow.commit().await?;

    Ok(Json(
        customer.accounts().iter().cloned().map(Into::into).collect(),
    ))
}

/// Open a new account.
///
/// # Request Body
///
/// ```json
/// {
///   "kind": "savings",
///   "initial_balance": "150.00"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: the opened account
/// - **400**: unknown account kind
/// - **404**: unknown customer
/// - **422**: negative or sub-cent initial balance, or a savings account
///   below its minimum opening balance
pub async fn open_account(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(request): Json<OpenAccountRequest>,
) -> Result<(StatusCode, Json<AccountResponse>), AppError> {
    let mut account = factory::create_account_named(&request.kind)?;
    if !request.initial_balance.is_zero() && !account.can_credit(request.initial_balance) {
        return Err(AppError::TransactionInvalid);
    }
    account.credit(request.initial_balance);

    let mut uow = state.store.begin().await?;
    let account = customer_service::add_account(&mut *uow, customer_id, account).await?;
    uow.commit().await?;

    Ok((StatusCode::CREATED, Json(account.into())))
}

/// Get one of the customer's accounts.
///
/// Returns 404 both when the account does not exist and when it belongs to
/// another customer.
pub async fn get_account(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(CustomerId, AccountId)>,
) -> Result<Json<AccountResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let account = account_service::get_owned_account(&mut *uow, account_id, customer_id).await?;
    uow.commit().await?;

    Ok(Json(account.into()))
}

/// Close an account.
///
/// # Response
///
/// - **204 No Content**: closed
/// - **404**: unknown customer, or account missing or not theirs
/// - **422**: balance is not zero
pub async fn close_account(
    State(state): State<AppState>,
    Path((customer_id, account_id)): Path<(CustomerId, AccountId)>,
) -> Result<StatusCode, AppError> {
    let mut uow = state.store.begin().await?;
    customer_service::close_account(&mut *uow, customer_id, account_id).await?;
    uow.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
