//! Recipient data model and API request/response types.
//!
//! A recipient is a customer-scoped alias for some account number. It is not
//! an account: the number only has to resolve to an existing account when a
//! transfer is made to it.

use serde::{Deserialize, Serialize};

use crate::models::ids::{AccountId, CustomerId, RecipientId};

#[derive(Debug, Clone, PartialEq)]
pub struct Recipient {
    /// Assigned by storage on first save
    pub id: Option<RecipientId>,

    /// Owning customer, `None` while detached
    pub customer_id: Option<CustomerId>,

    /// Display name
    pub name: String,
    pub email: String,
    pub phone: String,

    /// Account money is sent to
    pub account_number: AccountId,

    pub description: String,

    /// Optimistic concurrency counter
    pub version: i32,
}

impl Recipient {
    pub fn new(name: impl Into<String>, account_number: AccountId) -> Self {
        Self {
            id: None,
            customer_id: None,
            name: name.into(),
            email: String::new(),
            phone: String::new(),
            account_number,
            description: String::new(),
            version: 0,
        }
    }
}

/// Request body for registering or updating a recipient.
///
/// # JSON Example
///
/// ```json
/// {
///   "name": "Landlord",
///   "account_number": 17,
///   "description": "Monthly rent"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RecipientRequest {
    /// Present when updating an existing recipient
    #[serde(default)]
    pub id: Option<RecipientId>,

    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub phone: String,

    pub account_number: AccountId,

    #[serde(default)]
    pub description: String,
}

impl From<RecipientRequest> for Recipient {
    fn from(request: RecipientRequest) -> Self {
        Self {
            id: request.id,
            customer_id: None,
            name: request.name,
            email: request.email,
            phone: request.phone,
            account_number: request.account_number,
            description: request.description,
            version: 0,
        }
    }
}

/// Response body for recipient endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipientResponse {
    pub id: Option<RecipientId>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub account_number: AccountId,
    pub description: String,
}

impl From<Recipient> for RecipientResponse {
    fn from(recipient: Recipient) -> Self {
        Self {
            id: recipient.id,
            name: recipient.name,
            email: recipient.email,
            phone: recipient.phone,
            account_number: recipient.account_number,
            description: recipient.description,
        }
    }
}
