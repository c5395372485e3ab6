//! Budget and goal models
//!
//! Budgets cap monthly spending; goals track saving toward a target. Both
//! apply to a scope: everything, one category, or one account.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, BudgetId, CategoryId, GoalId};
use super::money::{Currency, Money};
use super::movement::Movement;

/// What a budget or goal applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scope {
    Global,
    Category { category_id: CategoryId },
    Account { account_id: AccountId },
}

impl Scope {
    /// Whether a movement falls inside this scope
    pub fn includes(&self, movement: &Movement) -> bool {
        match self {
            Self::Global => true,
            Self::Category { category_id } => movement.category_id == Some(*category_id),
            Self::Account { account_id } => movement.involves_account(*account_id),
        }
    }
}

impl Default for Scope {
    fn default() -> Self {
        Self::Global
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => write!(f, "All movements"),
            Self::Category { category_id } => write!(f, "Category {}", category_id),
            Self::Account { account_id } => write!(f, "Account {}", account_id),
        }
    }
}

/// A monthly spending limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: BudgetId,
    pub name: String,
    /// Limit per calendar month
    pub amount: Money,
    pub currency: Currency,
    #[serde(default)]
    pub scope: Scope,
    #[serde(default = "default_active")]
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl Budget {
    pub fn new(name: impl Into<String>, amount: Money, currency: Currency, scope: Scope) -> Self {
        let now = Utc::now();
        Self {
            id: BudgetId::new(),
            name: name.into(),
            amount,
            currency,
            scope,
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), TargetValidationError> {
        validate_target(&self.name, self.amount)
    }
}

/// A saving goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Money,
    pub currency: Currency,
    #[serde(default)]
    pub scope: Scope,
    /// Movements before this date don't count toward the goal
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(
        name: impl Into<String>,
        target_amount: Money,
        currency: Currency,
        scope: Scope,
        start_date: NaiveDate,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: GoalId::new(),
            name: name.into(),
            target_amount,
            currency,
            scope,
            start_date,
            deadline: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn validate(&self) -> Result<(), TargetValidationError> {
        validate_target(&self.name, self.target_amount)?;
        if let Some(deadline) = self.deadline {
            if deadline < self.start_date {
                return Err(TargetValidationError::DeadlineBeforeStart);
            }
        }
        Ok(())
    }
}

fn validate_target(name: &str, amount: Money) -> Result<(), TargetValidationError> {
    if name.trim().is_empty() {
        return Err(TargetValidationError::EmptyName);
    }
    if !amount.is_positive() {
        return Err(TargetValidationError::NonPositiveAmount(amount));
    }
    Ok(())
}

/// Validation errors shared by budgets and goals
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetValidationError {
    EmptyName,
    NonPositiveAmount(Money),
    DeadlineBeforeStart,
}

impl fmt::Display for TargetValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Target amount must be greater than zero (got {})", amount)
            }
            Self::DeadlineBeforeStart => write!(f, "Deadline cannot be before the start date"),
        }
    }
}

impl std::error::Error for TargetValidationError {}
