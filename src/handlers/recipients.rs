//! Recipient HTTP handlers.
//!
//! - GET    /api/customers/{cid}/recipients - List the customer's recipients
//! - POST   /api/customers/{cid}/recipients - Register or update a recipient
//! - DELETE /api/customers/{cid}/recipients/{rid} - Remove a recipient

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    error::AppError,
    models::{
        CustomerId, Recipient, RecipientId,
        recipient::{RecipientRequest, RecipientResponse},
    },
    routes::AppState,
    services::customer_service,
};

pub async fn list_recipients(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
) -> Result<Json<Vec<RecipientResponse>>, AppError> {
    let mut uow = state.store.begin().await?;
    let recipients = customer_service::list_recipients(&mut *uow, customer_id).await?;
    uow.commit().await?;

    Ok(Json(recipients.into_iter().map(Into::into).collect()))
}

/// Register a recipient.
///
/// # Request Body
///
/// ```json
/// {
///   "name": "Landlord",
///   "account_number": 17,
///   "description": "Monthly rent"
/// }
/// ```
///
/// # Response
///
/// - **201 Created**: new recipient
/// - **200 OK**: existing recipient updated
/// - **404**: unknown customer, account number unknown or the customer's own,
///   or updating a recipient the customer does not have
pub async fn add_recipient(
    State(state): State<AppState>,
    Path(customer_id): Path<CustomerId>,
    Json(request): Json<RecipientRequest>,
) -> Result<(StatusCode, Json<RecipientResponse>), AppError> {
    let status = if request.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };

    let mut uow = state.store.begin().await?;
    let recipient =
        customer_service::add_recipient(&mut *uow, customer_id, Recipient::from(request)).await?;
    uow.commit().await?;

    Ok((status, Json(recipient.into())))
}

pub async fn remove_recipient(
    State(state): State<AppState>,
    Path((customer_id, recipient_id)): Path<(CustomerId, RecipientId)>,
) -> Result<StatusCode, AppError> {
    let mut uow = state.store.begin().await?;
    customer_service::remove_recipient(&mut *uow, customer_id, recipient_id).await?;
    uow.commit().await?;

    Ok(StatusCode::NO_CONTENT)
}
