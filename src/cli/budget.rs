//! Budget CLI commands

use clap::Subcommand;

use crate::currency::format_amount;
use crate::display::budget::format_budget_overview;
use crate::display::Names;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{Scope, YearMonth};
use crate::services::{AccountService, BudgetPatch, BudgetService, CategoryService};
use crate::storage::Storage;

use super::{parse_currency, parse_money, parse_period};

#[derive(Subcommand)]
pub enum BudgetCommands {
    /// Create a monthly budget
    Create {
        /// Budget name
        name: String,
        /// Monthly limit
        amount: String,
        #[arg(long, default_value = "ARS")]
        currency: String,
        /// Limit to one category
        #[arg(short, long, conflicts_with = "account")]
        category: Option<String>,
        /// Limit to one account
        #[arg(short, long)]
        account: Option<String>,
    },
    /// Show the progress of every active budget
    Status {
        /// Month (YYYY-MM, defaults to the current one)
        #[arg(short, long)]
        month: Option<String>,
    },
    /// List budgets
    List {
        /// Include inactive budgets
        #[arg(short, long)]
        all: bool,
    },
    /// Edit a budget
    Edit {
        /// Budget name or ID
        budget: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long)]
        currency: Option<String>,
        /// Scope: "all", "category:<name>" or "account:<name>"
        #[arg(short, long)]
        scope: Option<String>,
    },
    /// Stop tracking a budget without deleting it
    Deactivate { budget: String },
    /// Resume tracking a budget
    Activate { budget: String },
    /// Delete a budget
    Delete { budget: String },
}

/// Build a scope from `--category` / `--account` flags
pub(crate) fn scope_from_flags(
    storage: &Storage,
    category: Option<&str>,
    account: Option<&str>,
) -> BilleteraResult<Scope> {
    match (category, account) {
        (Some(_), Some(_)) => Err(BilleteraError::Validation(
            "Use either --category or --account, not both".into(),
        )),
        (Some(category), None) => Ok(Scope::Category {
            category_id: CategoryService::new(storage).resolve(category)?.id,
        }),
        (None, Some(account)) => Ok(Scope::Account {
            account_id: AccountService::new(storage).resolve(account)?.id,
        }),
        (None, None) => Ok(Scope::Global),
    }
}

/// Parse "all", "category:<ref>" or "account:<ref>"
pub(crate) fn parse_scope(storage: &Storage, input: &str) -> BilleteraResult<Scope> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("all") || input.eq_ignore_ascii_case("global") {
        return Ok(Scope::Global);
    }
    match input.split_once(':') {
        Some((kind, reference)) if kind.eq_ignore_ascii_case("category") => {
            scope_from_flags(storage, Some(reference), None)
        }
        Some((kind, reference)) if kind.eq_ignore_ascii_case("account") => {
            scope_from_flags(storage, None, Some(reference))
        }
        _ => Err(BilleteraError::Validation(format!(
            "Invalid scope: '{}'. Use all, category:<name> or account:<name>",
            input
        ))),
    }
}

pub fn handle_budget_command(storage: &Storage, cmd: BudgetCommands) -> BilleteraResult<()> {
    let service = BudgetService::new(storage);

    match cmd {
        BudgetCommands::Create {
            name,
            amount,
            currency,
            category,
            account,
        } => {
            let scope = scope_from_flags(storage, category.as_deref(), account.as_deref())?;
            let budget = service.create(&name, parse_money(&amount)?, parse_currency(&currency)?, scope)?;
            println!(
                "Created budget: {} ({} per month)",
                budget.name,
                format_amount(budget.amount, budget.currency)
            );
            println!("  ID: {}", budget.id);
        }

        BudgetCommands::Status { month } => {
            let month = match month {
                Some(m) => parse_period(&m)?,
                None => YearMonth::current(),
            };
            let overview = service.overview(month)?;
            print!("{}", format_budget_overview(&overview, &Names::load(storage)?));
        }

        BudgetCommands::List { all } => {
            let budgets = service.list(all)?;
            if budgets.is_empty() {
                println!("No budgets found.");
            }
            let names = Names::load(storage)?;
            for budget in budgets {
                let inactive = if budget.active { "" } else { " (inactive)" };
                println!(
                    "  {}  {:24}  {:>16}  {}{}",
                    budget.id,
                    budget.name,
                    format_amount(budget.amount, budget.currency),
                    crate::display::budget::scope_label(&budget.scope, &names),
                    inactive
                );
            }
        }

        BudgetCommands::Edit {
            budget,
            name,
            amount,
            currency,
            scope,
        } => {
            let found = service.resolve(&budget)?;
            let patch = BudgetPatch {
                name,
                amount: amount.as_deref().map(parse_money).transpose()?,
                currency: currency.as_deref().map(parse_currency).transpose()?,
                scope: scope.as_deref().map(|s| parse_scope(storage, s)).transpose()?,
                active: None,
            };
            let updated = service.update(found.id, patch)?;
            println!("Updated budget: {}", updated.name);
        }

        BudgetCommands::Deactivate { budget } => {
            let found = service.resolve(&budget)?;
            let patch = BudgetPatch {
                active: Some(false),
                ..Default::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Deactivated budget: {}", updated.name);
        }

        BudgetCommands::Activate { budget } => {
            let found = service.resolve(&budget)?;
            let patch = BudgetPatch {
                active: Some(true),
                ..Default::default()
            };
            let updated = service.update(found.id, patch)?;
            println!("Activated budget: {}", updated.name);
        }

        BudgetCommands::Delete { budget } => {
            let found = service.resolve(&budget)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted budget: {}", deleted.name);
        }
    }

    Ok(())
}
