//! JSON export
//!
//! Exports every entity with a schema version and summary metadata.

use std::collections::HashSet;
use std::io::Write;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{
    Account, AutoRule, Budget, Category, Goal, Movement, RecurringTransaction,
    ScheduledTransaction, StatementPayment,
};
use crate::storage::Storage;

/// Current export schema version
pub const EXPORT_SCHEMA_VERSION: &str = "1.0.0";

/// Full database export structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullExport {
    pub schema_version: String,
    pub exported_at: DateTime<Utc>,
    pub app_version: String,
    pub accounts: Vec<Account>,
    pub categories: Vec<Category>,
    pub movements: Vec<Movement>,
    pub statement_payments: Vec<StatementPayment>,
    pub budgets: Vec<Budget>,
    pub goals: Vec<Goal>,
    pub recurring: Vec<RecurringTransaction>,
    pub scheduled: Vec<ScheduledTransaction>,
    pub rules: Vec<AutoRule>,
    pub metadata: ExportMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub account_count: usize,
    pub movement_count: usize,
    pub category_count: usize,
    /// Date of the oldest movement
    pub earliest_movement: Option<String>,
    /// Date of the newest movement
    pub latest_movement: Option<String>,
}

impl FullExport {
    pub fn from_storage(storage: &Storage) -> BilleteraResult<Self> {
        let accounts = storage.accounts.get_all()?;
        let categories = storage.categories.get_all()?;
        let mut movements = storage.movements.get_all()?;
        movements.reverse();

        let metadata = ExportMetadata {
            account_count: accounts.len(),
            movement_count: movements.len(),
            category_count: categories.len(),
            earliest_movement: movements.iter().map(|m| m.date).min().map(|d| d.to_string()),
            latest_movement: movements.iter().map(|m| m.date).max().map(|d| d.to_string()),
        };

        Ok(Self {
            schema_version: EXPORT_SCHEMA_VERSION.to_string(),
            exported_at: Utc::now(),
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            accounts,
            categories,
            movements,
            statement_payments: storage.statement_payments.get_all()?,
            budgets: storage.budgets.get_all()?,
            goals: storage.goals.get_all()?,
            recurring: storage.recurring.get_all()?,
            scheduled: storage.scheduled.get_all()?,
            rules: storage.rules.get_all()?,
            metadata,
        })
    }

    /// Check the schema version and that movements reference known entities
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version != EXPORT_SCHEMA_VERSION {
            return Err(format!(
                "Schema version mismatch: expected {}, got {}",
                EXPORT_SCHEMA_VERSION, self.schema_version
            ));
        }

        let account_ids: HashSet<_> = self.accounts.iter().map(|a| a.id).collect();
        let category_ids: HashSet<_> = self.categories.iter().map(|c| c.id).collect();

        for movement in &self.movements {
            let accounts = std::iter::once(movement.account_id).chain(movement.destination_account_id);
            for account_id in accounts {
                if !account_ids.contains(&account_id) {
                    return Err(format!(
                        "Movement {} references unknown account {}",
                        movement.id, account_id
                    ));
                }
            }
            if let Some(category_id) = movement.category_id {
                if !category_ids.contains(&category_id) {
                    return Err(format!(
                        "Movement {} references unknown category {}",
                        movement.id, category_id
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Export the full database to JSON
pub fn export_full_json<W: Write>(
    storage: &Storage,
    writer: &mut W,
    pretty: bool,
) -> BilleteraResult<()> {
    let export = FullExport::from_storage(storage)?;
    export.validate().map_err(BilleteraError::Export)?;

    if pretty {
        serde_json::to_writer_pretty(writer, &export)
    } else {
        serde_json::to_writer(writer, &export)
    }
    .map_err(|e| BilleteraError::Export(e.to_string()))?;

    Ok(())
}
