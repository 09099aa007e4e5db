//! Typed identifiers.
//!
//! Ids are assigned by the storage collaborator on first save and map to
//! `SERIAL` columns, so they wrap an `i32`. Keeping one newtype per entity
//! stops an account id from being passed where a customer id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub i32);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(value: i32) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(
    /// Identifier of an [`Account`](super::Account). Doubles as the account number.
    AccountId
);
entity_id!(
    /// Identifier of a [`Customer`](super::Customer).
    CustomerId
);
entity_id!(
    /// Identifier of a [`Recipient`](super::Recipient).
    RecipientId
);
