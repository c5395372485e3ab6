//! Account model
//!
//! Represents wallets, bank accounts and credit cards. Credit cards carry the
//! day of the month their statement closes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::AccountId;
use super::money::{Currency, Money};

/// A financial account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier
    pub id: AccountId,

    /// Account name (e.g., "Visa Galicia")
    pub name: String,

    /// Currency the account is held in
    pub currency: Currency,

    /// Whether this account is a credit card
    #[serde(default)]
    pub is_credit_card: bool,

    /// Day of month the card statement closes (credit cards only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closing_day: Option<u32>,

    /// Opening balance when the account was created
    #[serde(default)]
    pub initial_balance: Money,

    /// Whether this account is archived (soft-deleted)
    #[serde(default)]
    pub archived: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,

    /// Sort order for display
    #[serde(default)]
    pub sort_order: i32,
}

impl Account {
    /// Create a new regular account
    pub fn new(name: impl Into<String>, currency: Currency) -> Self {
        let now = Utc::now();
        Self {
            id: AccountId::new(),
            name: name.into(),
            currency,
            is_credit_card: false,
            closing_day: None,
            initial_balance: Money::zero(),
            archived: false,
            created_at: now,
            updated_at: now,
            sort_order: 0,
        }
    }

    /// Create a new credit card account with its statement closing day
    pub fn credit_card(name: impl Into<String>, currency: Currency, closing_day: u32) -> Self {
        let mut account = Self::new(name, currency);
        account.is_credit_card = true;
        account.closing_day = Some(closing_day);
        account
    }

    /// Closing day, only for credit cards
    pub fn statement_closing_day(&self) -> Option<u32> {
        if self.is_credit_card {
            self.closing_day
        } else {
            None
        }
    }

    pub fn archive(&mut self) {
        self.archived = true;
        self.updated_at = Utc::now();
    }

    pub fn unarchive(&mut self) {
        self.archived = false;
        self.updated_at = Utc::now();
    }

    /// Validate the account
    pub fn validate(&self) -> Result<(), AccountValidationError> {
        if self.name.trim().is_empty() {
            return Err(AccountValidationError::EmptyName);
        }

        if self.name.len() > 100 {
            return Err(AccountValidationError::NameTooLong(self.name.len()));
        }

        match (self.is_credit_card, self.closing_day) {
            (true, None) => return Err(AccountValidationError::MissingClosingDay),
            (true, Some(day)) if !(1..=31).contains(&day) => {
                return Err(AccountValidationError::InvalidClosingDay(day))
            }
            (false, Some(_)) => return Err(AccountValidationError::ClosingDayOnNonCard),
            _ => {}
        }

        Ok(())
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_credit_card {
            write!(f, "{} ({}, credit card)", self.name, self.currency)
        } else {
            write!(f, "{} ({})", self.name, self.currency)
        }
    }
}

/// Validation errors for accounts
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountValidationError {
    EmptyName,
    NameTooLong(usize),
    MissingClosingDay,
    InvalidClosingDay(u32),
    ClosingDayOnNonCard,
}

impl fmt::Display for AccountValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Account name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Account name too long ({} chars, max 100)", len)
            }
            Self::MissingClosingDay => write!(f, "Credit cards need a statement closing day"),
            Self::InvalidClosingDay(day) => {
                write!(f, "Closing day must be between 1 and 31 (got {})", day)
            }
            Self::ClosingDayOnNonCard => {
                write!(f, "Only credit cards can have a statement closing day")
            }
        }
    }
}

impl std::error::Error for AccountValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account() {
        let account = Account::new("Efectivo", Currency::Ars);
        assert_eq!(account.name, "Efectivo");
        assert!(!account.is_credit_card);
        assert_eq!(account.statement_closing_day(), None);
        assert!(account.validate().is_ok());
    }

    #[test]
    fn test_credit_card() {
        let card = Account::credit_card("Visa", Currency::Ars, 25);
        assert_eq!(card.statement_closing_day(), Some(25));
        assert!(card.validate().is_ok());
        assert_eq!(card.to_string(), "Visa (ARS, credit card)");
    }

    #[test]
    fn test_validation() {
        let mut card = Account::credit_card("Visa", Currency::Ars, 32);
        assert_eq!(
            card.validate(),
            Err(AccountValidationError::InvalidClosingDay(32))
        );

        card.closing_day = None;
        assert_eq!(card.validate(), Err(AccountValidationError::MissingClosingDay));

        let mut account = Account::new("  ", Currency::Usd);
        assert_eq!(account.validate(), Err(AccountValidationError::EmptyName));

        account.name = "Caja".into();
        account.closing_day = Some(10);
        assert_eq!(
            account.validate(),
            Err(AccountValidationError::ClosingDayOnNonCard)
        );
    }

    #[test]
    fn test_archive() {
        let mut account = Account::new("Old", Currency::Ars);
        account.archive();
        assert!(account.archived);
        account.unarchive();
        assert!(!account.archived);
    }

    #[test]
    fn test_serialization() {
        let account = Account::credit_card("Amex", Currency::Usd, 3);
        let json = serde_json::to_string(&account).unwrap();
        let deserialized: Account = serde_json::from_str(&json).unwrap();
        assert_eq!(account.id, deserialized.id);
        assert_eq!(deserialized.closing_day, Some(3));
        assert_eq!(deserialized.currency, Currency::Usd);
    }
}
