//! Customer HTTP handlers.
//!
//! - GET    /api/customers - List customers
//! - POST   /api/customers - Create (or update, when `id` is given) a customer
//! - GET    /api/customers/{cid} - Get customer
//! - DELETE /api/customers/{cid} - Delete customer without accounts
//! - GET    /api/customers/{cid}/balance - Total balance over all accounts

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    models::{
        Customer, CustomerId,
        customer::{BalanceResponse, CustomerRequest, CustomerResponse},
    },
    routes::AppState,
    services::customer_service,
};

pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<CustomerResponse>>, AppError> {
    let mut uow = state.store.begin().await?;
    let customers = customer_service::list_customers(&mut *uow).await?;
    uow.commit().await?;

    Ok(Json(customers.into_iter().map(Into::into).collect()))
}

/// Create or update a customer.
///
/// # Request Body
///
/// ```json
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "phone": "912345678"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: new customer
/// - **200 OK**: existing customer updated
/// - **404**: `id` given but unknown
pub async fn save_customer(
    State(state): State<AppState>,
    Json(request): Json<CustomerRequest>,
) -> Result<(StatusCode, Json<CustomerResponse>), AppError> {
    let status = if request.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let mut customer = Customer::new(
        request.first_name,
        request.last_name,
        request.email,
        request.phone,
    );
    customer.id = request.id;

    let mut uow = state.store.begin().await?;
    let customer = customer_service::save_customer(&mut *uow, customer).await?;
    uow.commit().await?;

    Ok((status, Json(customer.into())))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<CustomerResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let customer = customer_service::get_customer(&mut *uow, customer_id).await?;
    uow.commit().await?;

    Ok(Json(customer.into()))
}

/// Delete a customer.
///
/// # Response
///
/// - **204 No Content**: deleted
/// - **404**: unknown customer
/// - **409**: customer still owns accounts
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<StatusCode, AppError> {
    let mut uow = state.store.begin().await?;
    customer_service::delete_customer(&mut *uow, customer_id).await?;
    uow.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_balance(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<BalanceResponse>, AppError> {
    let mut uow = state.store.begin().await?;
    let balance = customer_service::get_balance(&mut *uow, customer_id).await?;
    uow.commit().await?;

    Ok(Json(BalanceResponse {
        customer_id,
        balance,
    }))
}
