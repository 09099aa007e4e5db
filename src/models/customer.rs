//! Customer aggregate and API request/response types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::account::Account;
use crate::models::ids::{AccountId, CustomerId, RecipientId};
use crate::models::recipient::Recipient;

/// A bank customer.
///
/// The customer owns its account and recipient records. Each owned record
/// points back through its `customer_id`; attaching or detaching keeps both
/// sides in step, and saving the customer persists the whole aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct Customer {
    /// Assigned by storage on first save
    pub id: Option<CustomerId>,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,

    /// Optimistic concurrency counter
    pub version: i32,

    accounts: Vec<Account>,
    recipients: Vec<Recipient>,
}

impl Customer {
    /// New customer with no accounts or recipients.
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone: phone.into(),
            version: 0,
            accounts: Vec::new(),
            recipients: Vec::new(),
        }
    }

    /// Attach loaded children. Used by storage when rebuilding the aggregate.
    pub fn with_children(mut self, accounts: Vec<Account>, recipients: Vec<Recipient>) -> Self {
        self.accounts = accounts;
        self.recipients = recipients;
        self
    }

    /// Split off the owned children, leaving only the profile.
    pub(crate) fn take_children(&mut self) -> (Vec<Account>, Vec<Recipient>) {
        (
            std::mem::take(&mut self.accounts),
            std::mem::take(&mut self.recipients),
        )
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn recipients(&self) -> &[Recipient] {
        &self.recipients
    }

    /// Whether `account_id` is one of this customer's accounts.
    pub fn owns_account(&self, account_id: AccountId) -> bool {
        self.accounts.iter().any(|a| a.id == Some(account_id))
    }

    /// Whether `account_id` is registered as one of this customer's recipients.
    pub fn has_recipient_account(&self, account_id: AccountId) -> bool {
        self.recipients.iter().any(|r| r.account_number == account_id)
    }

    pub fn recipient(&self, recipient_id: RecipientId) -> Option<&Recipient> {
        self.recipients.iter().find(|r| r.id == Some(recipient_id))
    }

    /// Sum of the balances of all owned accounts, `None` if it overflows.
    pub fn total_balance(&self) -> Option<Decimal> {
        self.accounts
            .iter()
            .try_fold(Decimal::ZERO, |total, account| total.checked_add(account.balance()))
    }

    /// Append `account` and point it back at this customer.
    pub fn add_account(&mut self, mut account: Account) {
        account.customer_id = self.id;
        self.accounts.push(account);
    }

    /// Detach the account with `account_id`, clearing its owner.
    pub fn remove_account(&mut self, account_id: AccountId) -> Option<Account> {
        let index = self.accounts.iter().position(|a| a.id == Some(account_id))?;
        let mut account = self.accounts.remove(index);
        account.customer_id = None;
        Some(account)
    }

    /// Append `recipient` and point it back at this customer.
    pub fn add_recipient(&mut self, mut recipient: Recipient) {
        recipient.customer_id = self.id;
        self.recipients.push(recipient);
    }

    /// Replace the stored copy of an already attached recipient.
    pub fn replace_recipient(&mut self, mut recipient: Recipient) -> bool {
        match self.recipients.iter_mut().find(|r| r.id == recipient.id) {
            Some(slot) => {
                recipient.customer_id = self.id;
                *slot = recipient;
                true
            }
            None => false,
        }
    }

    /// Detach the recipient with `recipient_id`, clearing its owner.
    pub fn remove_recipient(&mut self, recipient_id: RecipientId) -> Option<Recipient> {
        let index = self
            .recipients
            .iter()
            .position(|r| r.id == Some(recipient_id))?;
        let mut recipient = self.recipients.remove(index);
        recipient.customer_id = None;
        Some(recipient)
    }
}

/// Request body for creating or updating a customer.
///
/// # JSON Example
///
/// ```json
/// {
///   "first_name": "Ada",
///   "last_name": "Lovelace",
///   "email": "ada@example.com",
///   "phone": "+351 912 345 678"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CustomerRequest {
    /// Present when updating an existing customer
    #[serde(default)]
    pub id: Option<CustomerId>,

    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

/// Response body for customer endpoints. Children are listed by their own endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct CustomerResponse {
    pub id: Option<CustomerId>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub account_ids: Vec<AccountId>,
}

impl From<Customer> for CustomerResponse {
    fn from(customer: Customer) -> Self {
        Self {
            id: customer.id,
            account_ids: customer.accounts.iter().filter_map(|a| a.id).collect(),
            first_name: customer.first_name,
            last_name: customer.last_name,
            email: customer.email,
            phone: customer.phone,
        }
    }
}

/// Response body for the customer balance endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub customer_id: CustomerId,
    pub balance: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::account::AccountKind;
    use rust_decimal_macros::dec;

    fn stored_customer() -> Customer {
        let mut customer = Customer::new("Ada", "Lovelace", "ada@example.com", "912345678");
        customer.id = Some(CustomerId(1));
        customer
    }

    #[test]
    fn attaching_and_detaching_keeps_back_reference_in_step() {
        let mut customer = stored_customer();
        let account = Account::from_parts(AccountId(9), AccountKind::Checking, dec!(0), None, 0);

        customer.add_account(account);
        assert!(customer.owns_account(AccountId(9)));
        assert_eq!(customer.accounts()[0].customer_id, Some(CustomerId(1)));

        let detached = customer.remove_account(AccountId(9)).unwrap();
        assert_eq!(detached.customer_id, None);
        assert!(!customer.owns_account(AccountId(9)));
        assert!(customer.remove_account(AccountId(9)).is_none());
    }

    #[test]
    fn total_balance_sums_owned_accounts() {
        let mut customer = stored_customer();
        customer.add_account(Account::from_parts(
            AccountId(1),
            AccountKind::Checking,
            dec!(10.25),
            None,
            0,
        ));
        customer.add_account(Account::from_parts(
            AccountId(2),
            AccountKind::Savings,
            dec!(100),
            None,
            0,
        ));

        assert_eq!(customer.total_balance(), Some(dec!(110.25)));
    }

    #[test]
    fn total_balance_reports_overflow() {
        let mut customer = stored_customer();
        for id in [1, 2] {
            customer.add_account(Account::from_parts(
                AccountId(id),
                AccountKind::Checking,
                Decimal::MAX,
                None,
                0,
            ));
        }

        assert_eq!(customer.total_balance(), None);
    }

    #[test]
    fn recipients_are_matched_by_account_number() {
        let mut customer = stored_customer();
        let mut recipient = Recipient::new("Rent", AccountId(42));
        recipient.id = Some(RecipientId(5));
        customer.add_recipient(recipient);

        assert!(customer.has_recipient_account(AccountId(42)));
        assert!(!customer.has_recipient_account(AccountId(43)));
        assert_eq!(customer.recipients()[0].customer_id, Some(CustomerId(1)));
        assert!(customer.remove_recipient(RecipientId(5)).is_some());
        assert!(customer.recipients().is_empty());
    }
}
