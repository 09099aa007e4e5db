//! Storage collaborator.
//!
//! The ledger core never talks to a database directly. It works through a
//! [`UnitOfWork`]: a scoped transaction opened with [`Store::begin`] that
//! offers find/save/delete per entity type and is made durable with
//! [`UnitOfWork::commit`].
//!
//! # Atomicity
//!
//! Nothing a unit of work writes is visible to anyone else until `commit`
//! succeeds. Dropping it (or calling `rollback`) discards every change, so a
//! caller that only commits on `Ok` gets all-or-nothing behaviour on every
//! error path:
//!
//! ```ignore
//! let mut uow = store.begin().await?;
//! transfer_service::transfer(uow.as_mut(), transfer).await?;
//! uow.commit().await?;
//! ```
//!
//! # Concurrency
//!
//! Every entity carries a `version`. A save whose version does not match the
//! stored one, or a commit that finds a written entity changed underneath it,
//! fails with [`StoreError::Conflict`]. Retrying is left to the caller.

use async_trait::async_trait;

use crate::models::{Account, AccountId, Customer, CustomerId, Recipient, RecipientId};

/// In-process store
pub mod memory;
/// PostgreSQL store
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Failures reported by the storage collaborator.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed (connection error, query error, ...).
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Delete or update of an id that does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Entity was modified by another unit of work since it was read.
    #[error("Entity was modified concurrently, retry the operation")]
    Conflict,

    /// Store refused the operation.
    #[error("Storage unavailable")]
    Unavailable,

    /// Stored row could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// SQLSTATEs with which PostgreSQL aborts a transaction that lost a race:
/// `serialization_failure` and `deadlock_detected`.
const RETRYABLE_SQLSTATES: [&str; 2] = ["40001", "40P01"];

fn is_retryable_sqlstate(code: &str) -> bool {
    RETRYABLE_SQLSTATES.contains(&code)
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let retryable = err
            .as_database_error()
            .and_then(|db| db.code())
            .is_some_and(|code| is_retryable_sqlstate(&code));

        if retryable {
            tracing::warn!(error = %err, "transaction aborted by the database");
            StoreError::Conflict
        } else {
            StoreError::Database(err)
        }
    }
}

/// Source of units of work.
#[async_trait]
pub trait Store: Send + Sync {
    /// Open a new scoped transaction.
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError>;

    /// Check the store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// A scoped transaction over customers, accounts and recipients.
///
/// Saving a customer persists its whole aggregate: owned accounts and
/// recipients are inserted or updated, and children that were detached
/// from it are deleted.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError>;

    async fn find_all_customers(&mut self) -> Result<Vec<Customer>, StoreError>;

    /// Insert or update; returns the stored aggregate with ids assigned.
    async fn save_customer(&mut self, customer: Customer) -> Result<Customer, StoreError>;

    /// Remove a customer together with any records it still owns.
    async fn delete_customer(&mut self, id: CustomerId) -> Result<(), StoreError>;

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError>;

    async fn find_all_accounts(&mut self) -> Result<Vec<Account>, StoreError>;

    /// Load every existing account among `ids`, in ascending id order.
    ///
    /// Accounts are locked in that same order, so two units of work loading
    /// overlapping sets cannot wait on each other.
    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError>;

    async fn save_account(&mut self, account: Account) -> Result<Account, StoreError>;

    async fn delete_account(&mut self, id: AccountId) -> Result<(), StoreError>;

    async fn find_recipient(&mut self, id: RecipientId) -> Result<Option<Recipient>, StoreError>;

    async fn find_all_recipients(&mut self) -> Result<Vec<Recipient>, StoreError>;

    async fn save_recipient(&mut self, recipient: Recipient) -> Result<Recipient, StoreError>;

    async fn delete_recipient(&mut self, id: RecipientId) -> Result<(), StoreError>;

    /// Make every change durable and visible at once.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;

    /// Discard every change. Dropping the unit of work has the same effect.
    async fn rollback(self: Box<Self>) -> Result<(), StoreError>;
}
