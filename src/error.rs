//! Error types and HTTP error response handling.
//!
//! This module defines the ledger's error kinds and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use crate::store::StoreError;

/// Application-wide error type.
///
/// Every ledger operation fails with exactly one of these variants.
///
/// # Error Categories
///
/// - **Resource Errors**: customer, account or recipient not found
/// - **Business Logic Errors**: operations that violate a ledger rule
/// - **Storage Errors**: any failure reported by the storage collaborator
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No customer with the given id.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Customer does not exist")]
    CustomerNotFound,

    /// No account with the given id, or the account is not owned by (or not
    /// a permitted destination for) the acting customer.
    ///
    /// The two cases are reported identically so that callers cannot probe
    /// for other customers' account ids. Returns HTTP 404 Not Found.
    #[error("Account does not exist")]
    AccountNotFound,

    /// Recipient does not exist or belongs to another customer.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Recipient does not exist")]
    RecipientNotFound,

    /// An amount or balance rule was violated: insufficient funds, savings
    /// floor, direct withdrawal from savings, closing a non-empty account,
    /// opening an under-funded savings account.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Unable to perform transaction")]
    TransactionInvalid,

    /// Customer still owns accounts and cannot be deleted.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Entity contains association with another entity")]
    AssociationExists,

    /// Requested account kind is not supported.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Invalid account type: {0}")]
    InvalidAccountType(String),

    /// Storage collaborator failed.
    ///
    /// Concurrent modification maps to HTTP 409 so clients can retry;
    /// anything else is HTTP 500 with details hidden.
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),
}

impl AppError {
    /// Machine-readable code used in the JSON error body.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::CustomerNotFound => "customer_not_found",
            AppError::AccountNotFound => "account_not_found",
            AppError::RecipientNotFound => "recipient_not_found",
            AppError::TransactionInvalid => "transaction_invalid",
            AppError::AssociationExists => "association_exists",
            AppError::InvalidAccountType(_) => "invalid_account_type",
            AppError::Storage(StoreError::Conflict) => "concurrent_modification",
            AppError::Storage(_) => "internal_error",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::CustomerNotFound | AppError::AccountNotFound | AppError::RecipientNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::TransactionInvalid => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AssociationExists | AppError::Storage(StoreError::Conflict) => {
                StatusCode::CONFLICT
            }
            AppError::InvalidAccountType(_) => StatusCode::BAD_REQUEST,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert AppError into an HTTP response.
///
/// # Response Format
///
/// ```json
/// {
///   "error": {
///     "code": "transaction_invalid",
///     "message": "Unable to perform transaction"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Storage(StoreError::Conflict) => self.to_string(),
            AppError::Storage(err) => {
                tracing::error!(error = %err, "storage failure");
                "An internal error occurred".to_string()
            }
            _ => self.to_string(),
        };

        let body = Json(json!({
            "error": {
                "code": self.code(),
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
