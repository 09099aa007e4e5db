//! PostgreSQL store.
//!
//! A unit of work is one database transaction. Rows read through it are
//! locked with `FOR UPDATE` so no other transaction can modify them until
//! commit or rollback, and every update also checks the row's `version`.
//! Dropping the unit of work rolls the transaction back.

use std::collections::HashMap;

use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};

use crate::db::DbPool;
use crate::models::{
    Account, AccountId, AccountKind, Customer, CustomerId, Recipient, RecipientId,
};
use crate::store::{Store, StoreError, UnitOfWork};

const CUSTOMER_COLUMNS: &str = "id, first_name, last_name, email, phone, version";
const ACCOUNT_COLUMNS: &str = "id, account_type, balance, customer_id, version";
const RECIPIENT_COLUMNS: &str =
    "id, customer_id, name, email, phone, account_number, description, version";

#[derive(Debug, sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    version: i32,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        let mut customer = Customer::new(row.first_name, row.last_name, row.email, row.phone);
        customer.id = Some(row.id);
        customer.version = row.version;
        customer
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: AccountId,
    account_type: String,
    balance: Decimal,
    customer_id: Option<CustomerId>,
    version: i32,
}

impl TryFrom<AccountRow> for Account {
    type Error = StoreError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let kind = row
            .account_type
            .parse::<AccountKind>()
            .map_err(|err| StoreError::Corrupt(format!("account {}: {err}", row.id)))?;
        Ok(Account::from_parts(
            row.id,
            kind,
            row.balance,
            row.customer_id,
            row.version,
        ))
    }
}

#[derive(Debug, sqlx::FromRow)]
struct RecipientRow {
    id: RecipientId,
    customer_id: Option<CustomerId>,
    name: String,
    email: String,
    phone: String,
    account_number: AccountId,
    description: String,
    version: i32,
}

impl From<RecipientRow> for Recipient {
    fn from(row: RecipientRow) -> Self {
        Self {
            id: Some(row.id),
            customer_id: row.customer_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            account_number: row.account_number,
            description: row.description,
            version: row.version,
        }
    }
}

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Unit of work wrapping one PostgreSQL transaction.
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

impl PgUnitOfWork {
    async fn children_of(
        &mut self,
        customer_id: CustomerId,
    ) -> Result<(Vec<Account>, Vec<Recipient>), StoreError> {
        let accounts = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE customer_id = $1 ORDER BY id FOR UPDATE"
        ))
        .bind(customer_id)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(Account::try_from)
        .collect::<Result<Vec<_>, _>>()?;

        let recipients = sqlx::query_as::<_, RecipientRow>(&format!(
            "SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE customer_id = $1 ORDER BY id FOR UPDATE"
        ))
        .bind(customer_id)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(Recipient::from)
        .collect();

        Ok((accounts, recipients))
    }

    /// Turn an update that matched no row into the right error.
    async fn missed_update(&mut self, table: &str, id: i32) -> StoreError {
        let exists: Result<bool, sqlx::Error> =
            sqlx::query_scalar(&format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = $1)"))
                .bind(id)
                .fetch_one(&mut *self.tx)
                .await;
        match exists {
            Ok(true) => StoreError::Conflict,
            Ok(false) => StoreError::NotFound(format!("{table} {id}")),
            Err(err) => err.into(),
        }
    }
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn find_customer(&mut self, id: CustomerId) -> Result<Option<Customer>, StoreError> {
        let row = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let (accounts, recipients) = self.children_of(id).await?;
        Ok(Some(Customer::from(row).with_children(accounts, recipients)))
    }

    async fn find_all_customers(&mut self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query_as::<_, CustomerRow>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;

        let mut accounts: HashMap<CustomerId, Vec<Account>> = HashMap::new();
        for account in self.find_all_accounts().await? {
            if let Some(owner) = account.customer_id {
                accounts.entry(owner).or_default().push(account);
            }
        }
        let mut recipients: HashMap<CustomerId, Vec<Recipient>> = HashMap::new();
        for recipient in self.find_all_recipients().await? {
            if let Some(owner) = recipient.customer_id {
                recipients.entry(owner).or_default().push(recipient);
            }
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let id = row.id;
                Customer::from(row).with_children(
                    accounts.remove(&id).unwrap_or_default(),
                    recipients.remove(&id).unwrap_or_default(),
                )
            })
            .collect())
    }

    async fn save_customer(&mut self, mut customer: Customer) -> Result<Customer, StoreError> {
        let row = match customer.id {
            None => {
                sqlx::query_as::<_, CustomerRow>(&format!(
                    r#"
                    INSERT INTO customers (first_name, last_name, email, phone)
                    VALUES ($1, $2, $3, $4)
                    RETURNING {CUSTOMER_COLUMNS}
                    "#
                ))
                .bind(&customer.first_name)
                .bind(&customer.last_name)
                .bind(&customer.email)
                .bind(&customer.phone)
                .fetch_one(&mut *self.tx)
                .await?
            }
            Some(id) => {
                let updated = sqlx::query_as::<_, CustomerRow>(&format!(
                    r#"
                    UPDATE customers
                    SET first_name = $1, last_name = $2, email = $3, phone = $4,
                        version = version + 1, updated_at = NOW()
                    WHERE id = $5 AND version = $6
                    RETURNING {CUSTOMER_COLUMNS}
                    "#
                ))
                .bind(&customer.first_name)
                .bind(&customer.last_name)
                .bind(&customer.email)
                .bind(&customer.phone)
                .bind(id)
                .bind(customer.version)
                .fetch_optional(&mut *self.tx)
                .await?;
                match updated {
                    Some(row) => row,
                    None => return Err(self.missed_update("customers", id.0).await),
                }
            }
        };
        let id = row.id;
        let (accounts, recipients) = customer.take_children();

        let mut saved_accounts = Vec::with_capacity(accounts.len());
        for mut account in accounts {
            account.customer_id = Some(id);
            saved_accounts.push(self.save_account(account).await?);
        }
        let mut saved_recipients = Vec::with_capacity(recipients.len());
        for mut recipient in recipients {
            recipient.customer_id = Some(id);
            saved_recipients.push(self.save_recipient(recipient).await?);
        }

        // Orphan removal: children that used to belong here but were detached.
        let kept_accounts: Vec<i32> = saved_accounts
            .iter()
            .filter_map(|a| a.id.map(|id| id.0))
            .collect();
        sqlx::query("DELETE FROM accounts WHERE customer_id = $1 AND NOT (id = ANY($2))")
            .bind(id)
            .bind(&kept_accounts)
            .execute(&mut *self.tx)
            .await?;

        let kept_recipients: Vec<i32> = saved_recipients
            .iter()
            .filter_map(|r| r.id.map(|id| id.0))
            .collect();
        sqlx::query("DELETE FROM recipients WHERE customer_id = $1 AND NOT (id = ANY($2))")
            .bind(id)
            .bind(&kept_recipients)
            .execute(&mut *self.tx)
            .await?;

        Ok(Customer::from(row).with_children(saved_accounts, saved_recipients))
    }

    async fn delete_customer(&mut self, id: CustomerId) -> Result<(), StoreError> {
        // accounts and recipients go with it (ON DELETE CASCADE)
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("customer {id}")));
        }
        Ok(())
    }

    async fn find_account(&mut self, id: AccountId) -> Result<Option<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?
        .map(Account::try_from)
        .transpose()
    }

    async fn find_all_accounts(&mut self) -> Result<Vec<Account>, StoreError> {
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(Account::try_from)
        .collect()
    }

    async fn find_accounts(&mut self, ids: &[AccountId]) -> Result<Vec<Account>, StoreError> {
        let ids: Vec<i32> = ids.iter().map(|id| id.0).collect();
        sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&ids)
        .fetch_all(&mut *self.tx)
        .await?
        .into_iter()
        .map(Account::try_from)
        .collect()
    }

    async fn save_account(&mut self, account: Account) -> Result<Account, StoreError> {
        let row = match account.id {
            None => {
                sqlx::query_as::<_, AccountRow>(&format!(
                    r#"
                    INSERT INTO accounts (account_type, balance, customer_id)
                    VALUES ($1, $2, $3)
                    RETURNING {ACCOUNT_COLUMNS}
                    "#
                ))
                .bind(account.kind.as_str())
                .bind(account.balance())
                .bind(account.customer_id)
                .fetch_one(&mut *self.tx)
                .await?
            }
            Some(id) => {
                let updated = sqlx::query_as::<_, AccountRow>(&format!(
                    r#"
                    UPDATE accounts
                    SET balance = $1, customer_id = $2,
                        version = version + 1, updated_at = NOW()
                    WHERE id = $3 AND version = $4
                    RETURNING {ACCOUNT_COLUMNS}
                    "#
                ))
                .bind(account.balance())
                .bind(account.customer_id)
                .bind(id)
                .bind(account.version)
                .fetch_optional(&mut *self.tx)
                .await?;
                match updated {
                    Some(row) => row,
                    None => return Err(self.missed_update("accounts", id.0).await),
                }
            }
        };
        Account::try_from(row)
    }

    async fn delete_account(&mut self, id: AccountId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("account {id}")));
        }
        Ok(())
    }

    async fn find_recipient(&mut self, id: RecipientId) -> Result<Option<Recipient>, StoreError> {
        let row = sqlx::query_as::<_, RecipientRow>(&format!(
            "SELECT {RECIPIENT_COLUMNS} FROM recipients WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;
        Ok(row.map(Recipient::from))
    }

    async fn find_all_recipients(&mut self) -> Result<Vec<Recipient>, StoreError> {
        let rows = sqlx::query_as::<_, RecipientRow>(&format!(
            "SELECT {RECIPIENT_COLUMNS} FROM recipients ORDER BY id"
        ))
        .fetch_all(&mut *self.tx)
        .await?;
        Ok(rows.into_iter().map(Recipient::from).collect())
    }

    async fn save_recipient(&mut self, recipient: Recipient) -> Result<Recipient, StoreError> {
        let row = match recipient.id {
            None => {
                sqlx::query_as::<_, RecipientRow>(&format!(
                    r#"
                    INSERT INTO recipients (customer_id, name, email, phone, account_number, description)
                    VALUES ($1, $2, $3, $4, $5, $6)
                    RETURNING {RECIPIENT_COLUMNS}
                    "#
                ))
                .bind(recipient.customer_id)
                .bind(&recipient.name)
                .bind(&recipient.email)
                .bind(&recipient.phone)
                .bind(recipient.account_number)
                .bind(&recipient.description)
                .fetch_one(&mut *self.tx)
                .await?
            }
            Some(id) => {
                let updated = sqlx::query_as::<_, RecipientRow>(&format!(
                    r#"
                    UPDATE recipients
                    SET customer_id = $1, name = $2, email = $3, phone = $4,
                        account_number = $5, description = $6,
                        version = version + 1, updated_at = NOW()
                    WHERE id = $7 AND version = $8
                    RETURNING {RECIPIENT_COLUMNS}
                    "#
                ))
                .bind(recipient.customer_id)
                .bind(&recipient.name)
                .bind(&recipient.email)
                .bind(&recipient.phone)
                .bind(recipient.account_number)
                .bind(&recipient.description)
                .bind(id)
                .bind(recipient.version)
                .fetch_optional(&mut *self.tx)
                .await?;
                match updated {
                    Some(row) => row,
                    None => return Err(self.missed_update("recipients", id.0).await),
                }
            }
        };
        Ok(Recipient::from(row))
    }

    async fn delete_recipient(&mut self, id: RecipientId) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM recipients WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("recipient {id}")));
        }
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
