//! Service layer for Billetera
//!
//! The service layer provides business logic on top of the storage layer,
//! handling validation, computed fields, and cross-entity operations. Every
//! successful write is audited and announced on the storage's event bus.

pub mod account;
pub mod budget;
pub mod calendar;
pub mod category;
pub mod goal;
pub mod movement;
pub mod recurring;
pub mod rule;
pub mod scheduled;
pub mod statement;

pub use account::{AccountPatch, AccountService, AccountSummary, CreateAccountInput};
pub use budget::{BudgetPatch, BudgetProgress, BudgetService};
pub use calendar::{CalendarDay, CalendarEvent, CalendarMonth, CalendarService, DayTotal};
pub use category::{CategoryPatch, CategoryService};
pub use goal::{GoalPatch, GoalProgress, GoalService};
pub use movement::{
    BulkOutcome, CurrencySubtotal, MovementFilter, MovementInput, MovementPage, MovementPatch,
    MovementService, TransferInput,
};
pub use recurring::{PendingOccurrence, RecurringPatch, RecurringService, RecurringStats};
pub use rule::{RuleInput, RulePatch, RuleService, RuleSuggestion};
pub use scheduled::{ScheduledPatch, ScheduledService};
pub use statement::{StatementService, StatementSummary, StatementTotal};
