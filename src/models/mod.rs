//! Domain models and API request/response types.
//!
//! The ledger core works on three entities (`Account`, `Customer`, `Recipient`)
//! and one ephemeral value (`Transfer`). Entities reference each other by id
//! only; the `Customer` aggregate owns its account and recipient records.

/// Account variants and balance rules
pub mod account;
/// Customer aggregate
pub mod customer;
/// Typed entity identifiers
pub mod ids;
/// Customer-scoped transfer destinations
pub mod recipient;
/// Transfer request value
pub mod transfer;

pub use account::{Account, AccountKind, MAX_BALANCE, SAVINGS_MIN_BALANCE};
pub use customer::Customer;
pub use ids::{AccountId, CustomerId, RecipientId};
pub use recipient::Recipient;
pub use transfer::Transfer;
