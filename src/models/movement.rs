//! Movement model
//!
//! A movement is a single income, expense or transfer record. Credit-card
//! expenses can be split into installments ("cuotas") that share a group id
//! and carry an `n/total` marker.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ids::{AccountId, CategoryId, InstallmentGroupId, MovementId, RecurringId, ScheduledId};
use super::money::{Currency, Money};
use super::period::YearMonth;

/// Kind of movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    Income,
    Expense,
    Transfer,
}

impl MovementKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "ingreso" => Some(Self::Income),
            "expense" | "gasto" => Some(Self::Expense),
            "transfer" | "transferencia" => Some(Self::Transfer),
            _ => None,
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "Income"),
            Self::Expense => write!(f, "Expense"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// Installment marker, rendered as "n/total"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Installment {
    pub number: u32,
    pub total: u32,
}

impl Installment {
    pub fn new(number: u32, total: u32) -> Option<Self> {
        if number >= 1 && number <= total {
            Some(Self { number, total })
        } else {
            None
        }
    }

    pub fn is_last(&self) -> bool {
        self.number == self.total
    }
}

impl fmt::Display for Installment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.number, self.total)
    }
}

impl FromStr for Installment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (number, total) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| format!("Invalid installment marker: {}", s))?;
        let number: u32 = number
            .trim()
            .parse()
            .map_err(|_| format!("Invalid installment marker: {}", s))?;
        let total: u32 = total
            .trim()
            .parse()
            .map_err(|_| format!("Invalid installment marker: {}", s))?;
        Installment::new(number, total).ok_or_else(|| format!("Invalid installment marker: {}", s))
    }
}

impl From<Installment> for String {
    fn from(value: Installment) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Installment {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single income, expense or transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: MovementId,

    pub kind: MovementKind,

    pub date: NaiveDate,

    /// Amount, always positive; the kind decides the direction
    pub amount: Money,

    /// Currency of `amount` (the source account's currency)
    pub currency: Currency,

    /// Account the money comes from (expense, transfer) or goes to (income)
    pub account_id: AccountId,

    /// Transfer destination
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_account_id: Option<AccountId>,

    /// Amount credited to the destination (differs across currencies)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_amount: Option<Money>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,

    #[serde(default)]
    pub note: String,

    /// Path of an attached receipt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,

    /// Installment marker ("cuota")
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "cuota")]
    pub installment: Option<Installment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub installment_group: Option<InstallmentGroupId>,

    /// Credit-card statement this expense is billed in
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub statement_period: Option<YearMonth>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recurring_id: Option<RecurringId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheduled_id: Option<ScheduledId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Movement {
    pub fn new(
        kind: MovementKind,
        account_id: AccountId,
        date: NaiveDate,
        amount: Money,
        currency: Currency,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: MovementId::new(),
            kind,
            date,
            amount,
            currency,
            account_id,
            destination_account_id: None,
            destination_amount: None,
            category_id: None,
            note: String::new(),
            attachment: None,
            installment: None,
            installment_group: None,
            statement_period: None,
            recurring_id: None,
            scheduled_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn income(account_id: AccountId, date: NaiveDate, amount: Money, currency: Currency) -> Self {
        Self::new(MovementKind::Income, account_id, date, amount, currency)
    }

    pub fn expense(account_id: AccountId, date: NaiveDate, amount: Money, currency: Currency) -> Self {
        Self::new(MovementKind::Expense, account_id, date, amount, currency)
    }

    pub fn transfer(
        from: AccountId,
        to: AccountId,
        date: NaiveDate,
        amount: Money,
        currency: Currency,
        destination_amount: Money,
    ) -> Self {
        let mut movement = Self::new(MovementKind::Transfer, from, date, amount, currency);
        movement.destination_account_id = Some(to);
        movement.destination_amount = Some(destination_amount);
        movement
    }

    pub fn is_transfer(&self) -> bool {
        self.kind == MovementKind::Transfer
    }

    pub fn is_installment(&self) -> bool {
        self.installment.is_some()
    }

    /// Amount with sign from the point of view of `account_id`
    pub fn signed_amount_for(&self, account_id: AccountId) -> Money {
        match self.kind {
            MovementKind::Income if self.account_id == account_id => self.amount,
            MovementKind::Expense if self.account_id == account_id => -self.amount,
            MovementKind::Transfer => {
                let mut total = Money::zero();
                if self.account_id == account_id {
                    total -= self.amount;
                }
                if self.destination_account_id == Some(account_id) {
                    total += self.destination_amount.unwrap_or(self.amount);
                }
                total
            }
            _ => Money::zero(),
        }
    }

    /// Whether this movement touches the account on either side
    pub fn involves_account(&self, account_id: AccountId) -> bool {
        self.account_id == account_id || self.destination_account_id == Some(account_id)
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Validate the movement
    pub fn validate(&self) -> Result<(), MovementValidationError> {
        if !self.amount.is_positive() {
            return Err(MovementValidationError::NonPositiveAmount(self.amount));
        }

        match self.kind {
            MovementKind::Transfer => {
                let destination = self
                    .destination_account_id
                    .ok_or(MovementValidationError::MissingDestination)?;
                if destination == self.account_id {
                    return Err(MovementValidationError::SameAccountTransfer);
                }
                if let Some(dest_amount) = self.destination_amount {
                    if !dest_amount.is_positive() {
                        return Err(MovementValidationError::NonPositiveAmount(dest_amount));
                    }
                }
                if self.category_id.is_some() {
                    return Err(MovementValidationError::TransferWithCategory);
                }
                if self.installment.is_some() {
                    return Err(MovementValidationError::InstallmentOnNonExpense);
                }
            }
            MovementKind::Income => {
                if self.destination_account_id.is_some() {
                    return Err(MovementValidationError::DestinationOnNonTransfer);
                }
                if self.installment.is_some() {
                    return Err(MovementValidationError::InstallmentOnNonExpense);
                }
            }
            MovementKind::Expense => {
                if self.destination_account_id.is_some() {
                    return Err(MovementValidationError::DestinationOnNonTransfer);
                }
            }
        }

        Ok(())
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date.format("%Y-%m-%d"),
            self.kind,
            self.amount,
            self.currency
        )?;
        if let Some(installment) = self.installment {
            write!(f, " ({})", installment)?;
        }
        Ok(())
    }
}

/// Validation errors for movements
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovementValidationError {
    NonPositiveAmount(Money),
    MissingDestination,
    SameAccountTransfer,
    TransferWithCategory,
    DestinationOnNonTransfer,
    InstallmentOnNonExpense,
}

impl fmt::Display for MovementValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero (got {})", amount)
            }
            Self::MissingDestination => write!(f, "Transfers need a destination account"),
            Self::SameAccountTransfer => write!(f, "Cannot transfer to the same account"),
            Self::TransferWithCategory => write!(f, "Transfers cannot have a category"),
            Self::DestinationOnNonTransfer => {
                write!(f, "Only transfers can have a destination account")
            }
            Self::InstallmentOnNonExpense => write!(f, "Only expenses can be paid in installments"),
        }
    }
}

impl std::error::Error for MovementValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
    }

    #[test]
    fn test_installment_marker() {
        let marker: Installment = "3/12".parse().unwrap();
        assert_eq!(marker, Installment { number: 3, total: 12 });
        assert_eq!(marker.to_string(), "3/12");
        assert!(!marker.is_last());
        assert!("13/12".parse::<Installment>().is_err());
        assert!("0/3".parse::<Installment>().is_err());
        assert!("three".parse::<Installment>().is_err());
    }

    #[test]
    fn test_installment_serializes_as_cuota_string() {
        let mut movement = Movement::expense(AccountId::new(), date(), Money::from_cents(1000), Currency::Ars);
        movement.installment = Installment::new(1, 6);
        let json = serde_json::to_value(&movement).unwrap();
        assert_eq!(json["cuota"], "1/6");
        let back: Movement = serde_json::from_value(json).unwrap();
        assert_eq!(back.installment, Installment::new(1, 6));
    }

    #[test]
    fn test_signed_amounts() {
        let cash = AccountId::new();
        let bank = AccountId::new();

        let income = Movement::income(cash, date(), Money::from_cents(500), Currency::Ars);
        assert_eq!(income.signed_amount_for(cash), Money::from_cents(500));
        assert_eq!(income.signed_amount_for(bank), Money::zero());

        let expense = Movement::expense(cash, date(), Money::from_cents(200), Currency::Ars);
        assert_eq!(expense.signed_amount_for(cash), Money::from_cents(-200));

        let transfer = Movement::transfer(
            cash,
            bank,
            date(),
            Money::from_cents(100_000),
            Currency::Ars,
            Money::from_cents(100),
        );
        assert_eq!(transfer.signed_amount_for(cash), Money::from_cents(-100_000));
        assert_eq!(transfer.signed_amount_for(bank), Money::from_cents(100));
        assert!(transfer.involves_account(bank));
    }

    #[test]
    fn test_validation() {
        let account = AccountId::new();
        let zero = Movement::expense(account, date(), Money::zero(), Currency::Ars);
        assert!(matches!(
            zero.validate(),
            Err(MovementValidationError::NonPositiveAmount(_))
        ));

        let same = Movement::transfer(
            account,
            account,
            date(),
            Money::from_cents(100),
            Currency::Ars,
            Money::from_cents(100),
        );
        assert_eq!(same.validate(), Err(MovementValidationError::SameAccountTransfer));

        let mut income = Movement::income(account, date(), Money::from_cents(100), Currency::Ars);
        income.installment = Installment::new(1, 2);
        assert_eq!(
            income.validate(),
            Err(MovementValidationError::InstallmentOnNonExpense)
        );
    }

    #[test]
    fn test_display() {
        let mut movement = Movement::expense(AccountId::new(), date(), Money::from_cents(5000), Currency::Ars);
        assert_eq!(movement.to_string(), "2025-03-10 Expense 50.00 ARS");
        movement.installment = Installment::new(2, 3);
        assert_eq!(movement.to_string(), "2025-03-10 Expense 50.00 ARS (2/3)");
    }
}
