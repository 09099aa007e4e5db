//! In-process store.
//!
//! Each unit of work takes a snapshot of the tables at `begin`, applies its
//! writes to a private working copy, and on `commit` publishes the entries
//! it touched after checking none of them changed in the meantime. Dropping
//! the unit of work simply drops the working copy.
//!
//! Used when no `DATABASE_URL` is configured and by the test suite, which
//! can make saves fail on demand with [`MemoryStore::fail_saves_after`].

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::models::{Account, AccountId, Customer, CustomerId, Recipient, RecipientId};
use crate::store::{Store, StoreError, UnitOfWork};

const UNLIMITED: usize = usize::MAX;

/// Stored rows. Customers are kept without children; the aggregate is
/// rebuilt from the `customer_id` of each account and recipient.
#[derive(Debug, Clone, Default)]
struct Tables {
    customers: BTreeMap<CustomerId, Customer>,
    accounts: BTreeMap<AccountId, Account>,
    recipients: BTreeMap<RecipientId, Recipient>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum RowKey {
    Customer(CustomerId),
    Account(AccountId),
    Recipient(RecipientId),
}

impl Tables {
    fn version(&self, key: RowKey) -> Option<i32> {
        match key {
            RowKey::Customer(id) => self.customers.get(&id).map(|c| c.version),
            RowKey::Account(id) => self.accounts.get(&id).map(|a| a.version),
            RowKey::Recipient(id) => self.recipients.get(&id).map(|r| r.version),
        }
    }

    fn aggregate(&self, profile: &Customer) -> Customer {
        let owner = profile.id;
        let accounts = self
            .accounts
            .values()
            .filter(|a| a.customer_id.is_some() && a.customer_id == owner)
            .cloned()
            .collect();
        let recipients = self
            .recipients
            .values()
            .filter(|r| r.customer_id.is_some() && r.customer_id == owner)
            .cloned()
            .collect();
        profile.clone().with_children(accounts, recipients)
    }

    /// Copy the row for `key` from `source` into `self`, or remove it if
    /// `source` has none.
    fn publish(&mut self, source: &mut Tables, key: RowKey) {
        match key {
            RowKey::Customer(id) => match source.customers.remove(&id) {
                Some(row) => {
                    self.customers.insert(id, row);
                }
                None => {
                    self.customers.remove(&id);
                }
            },
            RowKey::Account(id) => match source.accounts.remove(&id) {
                Some(row) => {
                    self.accounts.insert(id, row);
                }
                None => {
                    self.accounts.remove(&id);
                }
            },
            RowKey::Recipient(id) => match source.recipients.remove(&id) {
                Some(row) => {
                    self.recipients.insert(id, row);
                }
                None => {
                    self.recipients.remove(&id);
                }
            },
        }
    }
}

#[derive(Debug)]
struct Shared {
    tables: RwLock<Tables>,
    next_id: AtomicI32,
    save_budget: AtomicUsize,
}

impl Shared {
    fn allocate_id(&self) -> i32 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Consume one save from the budget; `false` once it is exhausted.
    fn take_save_permit(&self) -> bool {
        self.save_budget
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| match left {
                UNLIMITED => Some(UNLIMITED),
                0 => None,
                n => Some(n - 1),
            })
            .is_ok()
    }
}

/// Thread-safe in-memory store. Clones share the same tables.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                tables: RwLock::new(Tables::default()),
                next_id: AtomicI32::new(1),
                save_budget: AtomicUsize::new(UNLIMITED),
            }),
        }
    }

    /// Let the next `saves` save calls succeed and fail every one after that
    /// with [`StoreError::Unavailable`].
    pub fn fail_saves_after(&self, saves: usize) {
        self.shared.save_budget.store(saves, Ordering::SeqCst);
    }

    /// Undo [`MemoryStore::fail_saves_after`].
    pub fn stop_failing(&self) {
        self.shared.save_budget.store(UNLIMITED, Ordering::SeqCst);
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let snapshot = self.shared.tables.read().await.clone();
        Ok(Box::new(MemoryUnitOfWork {
            shared: Arc::clone(&self.shared),
            base: snapshot.clone(),
            work: snapshot,
            dirty: BTreeSet::new(),
        }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Unit of work over a private copy of the tables.
pub struct MemoryUnitOfWork {
    shared: Arc<Shared>,
    base: Tables,
    work: Tables,
    dirty: BTreeSet<RowKey>,
}

impl MemoryUnitOfWork {
    fn ensure_permit(&self) -> Result<(), StoreError> {
        if self.shared.take_save_permit() {
            Ok(())
        } else {
            tracing::warn!("injected save failure");
            Err(StoreError::Unavailable)
        }
    }

    /// Assign a fresh id, or check the caller's version against the working
    /// copy and bump it. Returns the id to store under.
    fn stamp(
        &self,
        id: Option<i32>,
        version: &mut i32,
        key: impl Fn(i32) -> RowKey,
        what: &str,
    ) -> Result<i32, StoreError> {
        match id {
            None => {
                *version = 0;
                Ok(self.shared.allocate_id())
            }
            Some(id) => match self.work.version(key(id)) {
                None => Err(StoreError::NotFound(format!("{what} {id}"))),
                Some(current) if current != *version => Err(StoreError::Conflict),
                Some(_) => {
                    *version += 1;
                    Ok(id)
                }
            },
        }
    }

    fn upsert_account(&mut self, mut account: Account) -> Result<Account, StoreError> {
        if let Some(id) = account.id
            && self.work.accounts.get(&id) == Some(&account)
        {
            return Ok(account);
        }
        let raw = self.stamp(
            account.id.map(|id| id.0),
            &mut account.version,
            |id| RowKey::Account(AccountId(id)),
            "account",
        )?;
        let id = AccountId(raw);
        account.id = Some(id);
        self.work.accounts.insert(id, account.clone());
        self.dirty.insert(RowKey::Account(id));
        Ok(account)
    }

    fn upsert_recipient(&mut self, mut recipient: Recipient) -> Result<Recipient, StoreError> {
        if let Some(id) = recipient.id
            && self.work.recipients.get(&id) == Some(&recipient)
        {
            return Ok(recipient);
        }
        let raw = self.stamp(
            recipient.id.map(|id| id.0),
            &mut recipient.version,
            |id| RowKey::Recipient(RecipientId(id)),
            "recipient",
        )?;
        let id = RecipientId(raw);
        recipient.id = Some(id);
        self.work.recipients.insert(id, recipient.clone());
        self.dirty.insert(RowKey::Recipient(id));
        Ok(recipient)
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        Ok(self
            .work
            .customers
            .get(&id)
            .map(|profile| self.work.aggregate(profile)))
    }

    async fn find_all_customers(&mut self) -> Result<Vec<Customer>, StoreError> {
        Ok(self
            .work
            .customers
            .values()
            .map(|profile| self.work.aggregate(profile))
            .collect())
    }

    async fn save_customer(&mut self, mut customer: Customer) -> Result<Customer, StoreError> {
        self.ensure_permit()?;

        let raw = self.stamp(
            customer.id.map(|id| id.0),
            &mut customer.version,
            |id| RowKey::Customer(CustomerId(id)),
            "customer",
        )?;
        let id = CustomerId(raw);
        customer.id = Some(id);

        let (accounts, recipients) = customer.take_children();
        self.work.customers.insert(id, customer.clone());
        self.dirty.insert(RowKey::Customer(id));

        let mut saved_accounts = Vec::with_capacity(accounts.len());
        for mut account in accounts {
            account.customer_id = Some(id);
            saved_accounts.push(self.upsert_account(account)?);
        }
        let mut saved_recipients = Vec::with_capacity(recipients.len());
        for mut recipient in recipients {
            recipient.customer_id = Some(id);
            saved_recipients.push(self.upsert_recipient(recipient)?);
        }

        // Orphan removal: children that used to belong here but were detached.
        let kept_accounts: BTreeSet<AccountId> =
            saved_accounts.iter().filter_map(|a| a.id).collect();
        let orphaned_accounts: Vec<AccountId> = self
            .work
            .accounts
            .values()
            .filter(|a| a.customer_id == Some(id))
            .filter_map(|a| a.id)
            .filter(|account_id| !kept_accounts.contains(account_id))
            .collect();
        for account_id in orphaned_accounts {
            tracing::debug!(%account_id, customer_id = %id, "removing orphaned account");
            self.work.accounts.remove(&account_id);
            self.dirty.insert(RowKey::Account(account_id));
        }

        let kept_recipients: BTreeSet<RecipientId> =
            saved_recipients.iter().filter_map(|r| r.id).collect();
        let orphaned_recipients: Vec<RecipientId> = self
            .work
            .recipients
            .values()
            .filter(|r| r.customer_id == Some(id))
            .filter_map(|r| r.id)
            .filter(|recipient_id| !kept_recipients.contains(recipient_id))
            .collect();
        for recipient_id in orphaned_recipients {
            self.work.recipients.remove(&recipient_id);
            self.dirty.insert(RowKey::Recipient(recipient_id));
        }

        Ok(customer.with_children(saved_accounts, saved_recipients))
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<(), StoreError> {
        if self.work.customers.remove(&id).is_none() {
            return Err(StoreError::NotFound(format!("customer {id}")));
        }
        self.dirty.insert(RowKey::Customer(id));

        let owned_accounts: Vec<AccountId> = self
            .work
            .accounts
            .values()
            .filter(|a| a.customer_id == Some(id))
            .filter_map(|a| a.id)
            .collect();
        for account_id in owned_accounts {
            self.work.accounts.remove(&account_id);
            self.dirty.insert(RowKey::Account(account_id));
        }

        let owned_recipients: Vec<RecipientId> = self
            .work
            .recipients
            .values()
            .filter(|r| r.customer_id == Some(id))
            .filter_map(|r| r.id)
            .collect();
        for recipient_id in owned_recipients {
            self.work.recipients.remove(&recipient_id);
            self.dirty.insert(RowKey::Recipient(recipient_id));
        }
        Ok(())
    }

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        Ok(self.work.accounts.get(&id).cloned())
    }

    async fn find_all_accounts(&mut self) -> Result<Vec<Account>, StoreError> {
        Ok(self.work.accounts.values().cloned().collect())
    }

    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let wanted: BTreeSet<AccountId> = ids.iter().copied().collect();
        Ok(wanted
            .into_iter()
            .filter_map(|id| self.work.accounts.get(&id).cloned())
            .collect())
    }

    async fn save_account(&mut self, account: Account) -> Result<Account, StoreError> {
        self.ensure_permit()?;
        self.upsert_account(account)
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<(), StoreError> {
        self.work
            .accounts
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("account {id}")))?;
        self.dirty.insert(RowKey::Account(id));
        Ok(())
    }

    async fn find_recipient(&mut self, id: RecipientId) -> Result<Option<Recipient>, StoreError> {
        Ok(self.work.recipients.get(&id).cloned())
    }

    async fn find_all_recipients(&mut self) -> Result<Vec<Recipient>, StoreError> {
        Ok(self.work.recipients.values().cloned().collect())
    }

    async fn save_recipient(&mut self, recipient: Recipient) -> Result<Recipient, StoreError> {
        self.ensure_permit()?;
        self.upsert_recipient(recipient)
    }

    async fn delete_recipient(&mut self, id: RecipientId) -> Result<(), StoreError> {
        self.work
            .recipients
            .remove(&id)
            .ok_or_else(|| StoreError::NotFound(format!("recipient {id}")))?;
        self.dirty.insert(RowKey::Recipient(id));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let MemoryUnitOfWork {
            shared,
            base,
            mut work,
            dirty,
        } = *self;

        let mut live = shared.tables.write().await;
        if let Some(key) = dirty
            .iter()
            .copied()
            .find(|key| live.version(*key) != base.version(*key))
        {
            tracing::warn!(?key, "commit rejected, row changed since unit of work began");
            return Err(StoreError::Conflict);
        }

        for key in dirty {
            live.publish(&mut work, key);
        }
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        Ok(())
    }
}
