//! Scheduled transaction model
//!
//! A one-off movement planned for a future date. When the date arrives it is
//! either posted automatically or held until the user approves it.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, MovementId, ScheduledId};
use super::money::{Currency, Money};
use super::movement::MovementKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScheduledStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ScheduledStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl fmt::Display for ScheduledStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledTransaction {
    pub id: ScheduledId,
    pub kind: MovementKind,
    pub date: NaiveDate,
    pub amount: Money,
    pub currency: Currency,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<AccountId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_amount: Option<Money>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub note: String,
    /// Hold the item for approval instead of posting it when due
    #[serde(default = "default_requires_approval")]
    pub requires_approval: bool,
    #[serde(default)]
    pub status: ScheduledStatus,
    /// Movement created on approval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movement_id: Option<MovementId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_requires_approval() -> bool {
    true
}

impl ScheduledTransaction {
    pub fn new(
        kind: MovementKind,
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: ScheduledId::new(),
            kind,
            date,
            amount,
            currency,
            account_id,
            destination_account_id: None,
            destination_amount: None,
            category_id: None,
            note: String::new(),
            requires_approval: true,
            status: ScheduledStatus::Pending,
            movement_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == ScheduledStatus::Pending
    }

    /// Pending and dated on or before `today`
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.is_pending() && self.date <= today
    }

    pub fn validate(&self) -> Result<(), ScheduledValidationError> {
        if !self.amount.is_positive() {
            return Err(ScheduledValidationError::NonPositiveAmount(self.amount));
        }
        match (self.kind, self.destination_account_id) {
            (MovementKind::Transfer, None) => Err(ScheduledValidationError::MissingDestination),
            (MovementKind::Transfer, Some(dest)) if dest == self.account_id => {
                Err(ScheduledValidationError::SameAccountTransfer)
            }
            (MovementKind::Income | MovementKind::Expense, Some(_)) => {
                Err(ScheduledValidationError::DestinationOnNonTransfer)
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for ScheduledTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} [{}]",
            self.date.format("%Y-%m-%d"),
            self.kind,
            self.amount,
            self.currency,
            self.status
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduledValidationError {
    NonPositiveAmount(Money),
    MissingDestination,
    SameAccountTransfer,
    DestinationOnNonTransfer,
}

impl fmt::Display for ScheduledValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero (got {})", amount)
            }
            Self::MissingDestination => write!(f, "Transfers need a destination account"),
            Self::SameAccountTransfer => write!(f, "Cannot transfer to the same account"),
            Self::DestinationOnNonTransfer => {
                write!(f, "Only transfers can have a destination account")
            }
        }
    }
}

impl std::error::Error for ScheduledValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    #[test]
    fn test_is_due() {
        let mut item = ScheduledTransaction::new(
            MovementKind::Expense,
            AccountId::new(),
            date(10),
            Money::from_cents(1000),
            Currency::Ars,
        );
        assert!(!item.is_due(date(9)));
        assert!(item.is_due(date(10)));
        item.status = ScheduledStatus::Rejected;
        assert!(!item.is_due(date(20)));
    }

    #[test]
    fn test_transfer_validation() {
        let account = AccountId::new();
        let mut item = ScheduledTransaction::new(
            MovementKind::Transfer,
            account,
            date(1),
            Money::from_cents(1000),
            Currency::Ars,
        );
        assert_eq!(item.validate(), Err(ScheduledValidationError::MissingDestination));
        item.destination_account_id = Some(account);
        assert_eq!(item.validate(), Err(ScheduledValidationError::SameAccountTransfer));
        item.destination_account_id = Some(AccountId::new());
        assert!(item.validate().is_ok());
    }

    #[test]
    fn test_defaults_on_deserialize() {
        let item = ScheduledTransaction::new(
            MovementKind::Income,
            AccountId::new(),
            date(1),
            Money::from_cents(1),
            Currency::Usd,
        );
        let mut json = serde_json::to_value(&item).unwrap();
        let obj = json.as_object_mut().unwrap();
        obj.remove("status");
        obj.remove("requires_approval");
        let back: ScheduledTransaction = serde_json::from_value(json).unwrap();
        assert_eq!(back.status, ScheduledStatus::Pending);
        assert!(back.requires_approval);
    }
}
