//! Display formatting for terminal output
//!
//! Formats accounts, movements, statements, budgets, goals, recurring and
//! scheduled transactions, rules and the calendar for the CLI.

pub mod account;
pub mod budget;
pub mod calendar;
pub mod category;
pub mod movement;
pub mod recurring;
pub mod rule;
pub mod statement;

use std::collections::HashMap;

use crate::error::BilleteraResult;
use crate::models::{AccountId, CategoryId};
use crate::storage::Storage;

pub use account::{format_account_details, format_account_list};
pub use budget::{format_budget_overview, format_goal_details, format_goal_list};
pub use calendar::format_calendar_month;
pub use category::format_category_list;
pub use movement::{format_bulk_outcome, format_movement_details, format_movement_page};
pub use recurring::{format_pending_occurrences, format_recurring_list, format_scheduled_list};
pub use rule::{format_rule_details, format_rule_list};
pub use statement::{format_period_options, format_statement_summary};

/// Account and category names keyed by ID, for rendering references
#[derive(Debug, Clone, Default)]
pub struct Names {
    accounts: HashMap<AccountId, String>,
    categories: HashMap<CategoryId, String>,
}

impl Names {
    pub fn load(storage: &Storage) -> BilleteraResult<Self> {
        let accounts = storage
            .accounts
            .get_all()?
            .into_iter()
            .map(|a| (a.id, a.name))
            .collect();
        let categories = storage
            .categories
            .get_all()?
            .into_iter()
            .map(|c| (c.id, c.label()))
            .collect();
        Ok(Self {
            accounts,
            categories,
        })
    }

    pub fn account(&self, id: AccountId) -> String {
        self.accounts
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.to_string())
    }

    pub fn category(&self, id: Option<CategoryId>) -> String {
        match id {
            Some(id) => self
                .categories
                .get(&id)
                .cloned()
                .unwrap_or_else(|| id.to_string()),
            None => "-".to_string(),
        }
    }

    #[cfg(test)]
    pub(crate) fn insert_account(&mut self, id: AccountId, name: &str) {
        self.accounts.insert(id, name.to_string());
    }

    #[cfg(test)]
    pub(crate) fn insert_category(&mut self, id: CategoryId, name: &str) {
        self.categories.insert(id, name.to_string());
    }
}

/// Truncate a string to a maximum display width
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        format!("{}...", s.chars().take(max_len - 3).collect::<String>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer note", 8), "a lon...");
        assert_eq!(truncate("abcdef", 2), "ab");
    }

    #[test]
    fn test_names_fallback_to_id() {
        let names = Names::default();
        let id = AccountId::new();
        assert_eq!(names.account(id), id.to_string());
        assert_eq!(names.category(None), "-");
    }
}
