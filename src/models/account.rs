//! Account data model and API request/response types.
//!
//! This module defines:
//! - `AccountKind`: the closed set of account variants and their balance policy
//! - `Account`: the balance-holding entity
//! - `OpenAccountRequest` / `AmountRequest`: request bodies
//! - `AccountResponse`: response body returned to clients

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::error::AppError;
use crate::models::ids::{AccountId, CustomerId};

/// Lowest balance a savings account may hold after a debit, and the smallest
/// initial balance it may be opened with.
pub const SAVINGS_MIN_BALANCE: Decimal = Decimal::ONE_HUNDRED;

/// Largest balance an account may hold, `99999999999999999.99`. Matches the
/// `NUMERIC(19,2)` balance column.
pub const MAX_BALANCE: Decimal = Decimal::from_parts(2_313_682_943, 2_328_306_436, 0, false, 2);

/// Amounts carry at most this many decimal places.
pub const MONEY_SCALE: u32 = 2;

/// Positive, and no finer than a cent.
fn is_money(amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount.normalize().scale() <= MONEY_SCALE
}

/// Account variant.
///
/// Each variant carries its policy as data: the balance floor enforced on
/// every debit and whether direct withdrawals are allowed. Adding a kind
/// means adding a variant here and a row to each `match` below.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    /// No balance floor, supports withdrawals
    Checking,

    /// Floor of [`SAVINGS_MIN_BALANCE`], transfer-out only
    Savings,
}

impl AccountKind {
    /// Every supported account kind.
    pub const ALL: [AccountKind; 2] = [AccountKind::Checking, AccountKind::Savings];

    /// Balance that must remain after any debit.
    pub fn minimum_balance(self) -> Decimal {
        match self {
            AccountKind::Checking => Decimal::ZERO,
            AccountKind::Savings => SAVINGS_MIN_BALANCE,
        }
    }

    /// Whether money may be withdrawn directly (as opposed to transferred out).
    pub fn allows_withdrawal(self) -> bool {
        match self {
            AccountKind::Checking => true,
            AccountKind::Savings => false,
        }
    }

    /// Name used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            AccountKind::Checking => "checking",
            AccountKind::Savings => "savings",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AccountKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| AppError::InvalidAccountType(s.to_string()))
    }
}

/// A balance-holding account.
///
/// The balance is private: it only changes through [`Account::credit`] and
/// [`Account::debit`], each of which is a no-op unless the matching
/// `can_*` predicate holds. Services check the predicate first and turn a
/// refusal into `AppError::TransactionInvalid`; the account itself never
/// reports errors.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    /// Assigned by storage on first save, `None` until then
    pub id: Option<AccountId>,

    /// Variant, fixed at creation
    pub kind: AccountKind,

    /// Current balance, never negative
    balance: Decimal,

    /// Owning customer, `None` while detached
    pub customer_id: Option<CustomerId>,

    /// Optimistic concurrency counter, bumped by storage on every save
    pub version: i32,
}

impl Account {
    /// New detached account of `kind` with a zero balance.
    pub fn new(kind: AccountKind) -> Self {
        Self {
            id: None,
            kind,
            balance: Decimal::ZERO,
            customer_id: None,
            version: 0,
        }
    }

    /// Rebuild an account from stored fields.
    pub fn from_parts(
        id: AccountId,
        kind: AccountKind,
        balance: Decimal,
        customer_id: Option<CustomerId>,
        version: i32,
    ) -> Self {
        Self {
            id: Some(id),
            kind,
            balance,
            customer_id,
            version,
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// True iff `amount` is a positive whole number of cents and the new
    /// balance stays within [`MAX_BALANCE`].
    pub fn can_credit(&self, amount: Decimal) -> bool {
        is_money(amount)
            && self
                .balance
                .checked_add(amount)
                .is_some_and(|total| total <= MAX_BALANCE)
    }

    /// True iff `amount` is positive, covered by the balance, and leaves at
    /// least the kind's minimum balance behind.
    pub fn can_debit(&self, amount: Decimal) -> bool {
        is_money(amount)
            && amount <= self.balance
            && self.balance - amount >= self.kind.minimum_balance()
    }

    pub fn can_withdraw(&self) -> bool {
        self.kind.allows_withdrawal()
    }

    /// Add `amount` to the balance. Ignored unless `can_credit(amount)`.
    pub fn credit(&mut self, amount: Decimal) {
        if self.can_credit(amount) {
            self.balance += amount;
        }
    }

    /// Subtract `amount` from the balance. Ignored unless `can_debit(amount)`.
    pub fn debit(&mut self, amount: Decimal) {
        if self.can_debit(amount) {
            self.balance -= amount;
        }
    }

    /// Whether this account is attached to `customer_id`.
    pub fn is_owned_by(&self, customer_id: CustomerId) -> bool {
        self.customer_id == Some(customer_id)
    }
}

/// Request body for opening a new account.
///
/// # JSON Example
///
/// ```json
/// {
///   "kind": "savings",
///   "initial_balance": "250.00"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct OpenAccountRequest {
    /// Account kind name (`checking` or `savings`)
    pub kind: String,

    /// Amount credited at creation (defaults to 0)
    #[serde(default)]
    pub initial_balance: Decimal,
}

/// Request body for deposits and withdrawals.
#[derive(Debug, Deserialize)]
pub struct AmountRequest {
    pub amount: Decimal,
}

/// Response body for account endpoints.
///
/// # JSON Example
///
/// ```json
/// {
///   "id": 7,
///   "kind": "checking",
///   "balance": "150.00",
///   "customer_id": 3
/// }
/// ```
#[derive(Debug, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: Option<AccountId>,
    pub kind: AccountKind,
    pub balance: Decimal,
    pub customer_id: Option<CustomerId>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            kind: account.kind,
            balance: account.balance,
            customer_id: account.customer_id,
        }
    }
}
