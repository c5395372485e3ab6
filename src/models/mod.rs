//! Core data models for Billetera
//!
//! This module contains the data structures of the finance domain: accounts,
//! categories, movements, statement payments, budgets, goals, recurring and
//! scheduled transactions, and auto-categorization rules.

pub mod account;
pub mod budget;
pub mod category;
pub mod ids;
pub mod money;
pub mod movement;
pub mod period;
pub mod recurring;
pub mod rule;
pub mod scheduled;
pub mod statement_payment;

pub use account::{Account, AccountValidationError};
pub use budget::{Budget, Goal, Scope, TargetValidationError};
pub use category::{Category, CategoryKind, CategoryValidationError};
pub use ids::{
    AccountId, BudgetId, CategoryId, GoalId, InstallmentGroupId, MovementId, RecurringId, RuleId,
    ScheduledId, StatementPaymentId,
};
pub use money::{Currency, Money, MoneyParseError};
pub use movement::{Installment, Movement, MovementKind, MovementValidationError};
pub use period::{PeriodParseError, YearMonth};
pub use recurring::{
    CreationMode, Frequency, OccurrenceRecord, OccurrenceStatus, RecurringTransaction,
    RecurringValidationError,
};
pub use rule::{
    Action, ActionField, AutoRule, Condition, ConditionField, MatchMode, Operator,
    RuleValidationError,
};
pub use scheduled::{ScheduledStatus, ScheduledTransaction, ScheduledValidationError};
pub use statement_payment::StatementPayment;
