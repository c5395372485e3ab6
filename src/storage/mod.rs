//! Storage layer for Billetera
//!
//! JSON files with atomic writes, one per entity type, plus the audit log
//! and the change-notification bus shared by the services.

pub mod file_io;
pub mod init;
pub mod movements;
pub mod repository;

pub use file_io::{read_json, write_json_atomic};
pub use init::initialize_storage;
pub use movements::MovementRepository;
pub use repository::{JsonRepository, Record};

use serde::Serialize;
use tracing::debug;

use crate::audit::{generate_diff, AuditEntry, AuditLogger, EntityType};
use crate::config::paths::BilleteraPaths;
use crate::error::BilleteraError;
use crate::events::DataEvents;
use crate::models::{
    Account, AutoRule, Budget, Category, Goal, RecurringTransaction, ScheduledTransaction,
    StatementPayment,
};

pub type AccountRepository = JsonRepository<Account>;
pub type CategoryRepository = JsonRepository<Category>;
pub type StatementPaymentRepository = JsonRepository<StatementPayment>;
pub type BudgetRepository = JsonRepository<Budget>;
pub type GoalRepository = JsonRepository<Goal>;
pub type RecurringRepository = JsonRepository<RecurringTransaction>;
pub type ScheduledRepository = JsonRepository<ScheduledTransaction>;
pub type RuleRepository = JsonRepository<AutoRule>;

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: BilleteraPaths,
    audit: AuditLogger,
    events: DataEvents,
    pub accounts: AccountRepository,
    pub categories: CategoryRepository,
    pub movements: MovementRepository,
    pub statement_payments: StatementPaymentRepository,
    pub budgets: BudgetRepository,
    pub goals: GoalRepository,
    pub recurring: RecurringRepository,
    pub scheduled: ScheduledRepository,
    pub rules: RuleRepository,
}

impl Storage {
    pub fn new(paths: BilleteraPaths) -> Result<Self, BilleteraError> {
        paths.ensure_directories()?;

        Ok(Self {
            audit: AuditLogger::new(paths.audit_log()),
            events: DataEvents::new(),
            accounts: AccountRepository::new(paths.accounts_file()),
            categories: CategoryRepository::new(paths.categories_file()),
            movements: MovementRepository::new(paths.movements_file()),
            statement_payments: StatementPaymentRepository::new(paths.statement_payments_file()),
            budgets: BudgetRepository::new(paths.budgets_file()),
            goals: GoalRepository::new(paths.goals_file()),
            recurring: RecurringRepository::new(paths.recurring_file()),
            scheduled: ScheduledRepository::new(paths.scheduled_file()),
            rules: RuleRepository::new(paths.rules_file()),
            paths,
        })
    }

    pub fn paths(&self) -> &BilleteraPaths {
        &self.paths
    }

    pub fn audit(&self) -> &AuditLogger {
        &self.audit
    }

    pub fn events(&self) -> &DataEvents {
        &self.events
    }

    /// Load all data from disk
    pub fn load_all(&self) -> Result<(), BilleteraError> {
        self.accounts.load()?;
        self.categories.load()?;
        self.movements.load()?;
        self.statement_payments.load()?;
        self.budgets.load()?;
        self.goals.load()?;
        self.recurring.load()?;
        self.scheduled.load()?;
        self.rules.load()?;
        debug!(base = %self.paths.base_dir().display(), "storage loaded");
        Ok(())
    }

    /// Save all data to disk
    pub fn save_all(&self) -> Result<(), BilleteraError> {
        self.accounts.save()?;
        self.categories.save()?;
        self.movements.save()?;
        self.statement_payments.save()?;
        self.budgets.save()?;
        self.goals.save()?;
        self.recurring.save()?;
        self.scheduled.save()?;
        self.rules.save()?;
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.paths.is_initialized()
    }

    pub fn log_create<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), BilleteraError> {
        self.audit
            .log(&AuditEntry::create(entity_type, entity_id, entity_name, entity))
    }

    pub fn log_update<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        before: &T,
        after: &T,
    ) -> Result<(), BilleteraError> {
        let diff = match (serde_json::to_value(before), serde_json::to_value(after)) {
            (Ok(b), Ok(a)) => generate_diff(&b, &a),
            _ => None,
        };
        self.audit.log(&AuditEntry::update(
            entity_type,
            entity_id,
            entity_name,
            before,
            after,
            diff,
        ))
    }

    pub fn log_delete<T: Serialize>(
        &self,
        entity_type: EntityType,
        entity_id: impl Into<String>,
        entity_name: Option<String>,
        entity: &T,
    ) -> Result<(), BilleteraError> {
        self.audit
            .log(&AuditEntry::delete(entity_type, entity_id, entity_name, entity))
    }
}
