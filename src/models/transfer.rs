//! Transfer value.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::ids::AccountId;

/// Request to move `amount` from one account to another.
///
/// Built per request and discarded once the transfer engine applies it;
/// transfers are not persisted.
///
/// # JSON Example
///
/// ```json
/// {
///   "source_id": 3,
///   "destination_id": 8,
///   "amount": "100.00"
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transfer {
    /// Account to transfer from (will decrease)
    pub source_id: AccountId,

    /// Account to transfer to (will increase)
    pub destination_id: AccountId,

    pub amount: Decimal,
}

impl Transfer {
    pub fn new(source_id: AccountId, destination_id: AccountId, amount: Decimal) -> Self {
        Self {
            source_id,
            destination_id,
            amount,
        }
    }
}
