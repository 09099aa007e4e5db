//! Account factory.
//!
//! The one place that turns a requested account kind into a fresh account.
//! New account kinds are wired in here and in [`AccountKind`].

use crate::error::AppError;
use crate::models::account::{Account, AccountKind};

/// Build a new zero-balance, detached account of `kind`.
pub fn create_account(kind: AccountKind) -> Account {
    tracing::debug!(%kind, "creating account");
    Account::new(kind)
}

/// Build a new account from a kind name such as `"savings"`.
///
/// # Errors
///
/// - `InvalidAccountType`: `name` is not one of [`AccountKind::ALL`]
pub fn create_account_named(name: &str) -> Result<Account, AppError> {
    let kind = name.parse::<AccountKind>()?;
    Ok(create_account(kind))
}
