//! CLI command handlers
//!
//! This module contains the implementation of CLI commands,
//! bridging the clap argument parsing with the service layer.

pub mod account;
pub mod audit;
pub mod budget;
pub mod calendar;
pub mod category;
pub mod export;
pub mod goal;
pub mod movement;
pub mod recurring;
pub mod rule;
pub mod scheduled;
pub mod statement;

pub use account::{handle_account_command, AccountCommands};
pub use audit::{handle_audit_command, AuditArgs};
pub use budget::{handle_budget_command, BudgetCommands};
pub use calendar::{handle_calendar_command, CalendarArgs};
pub use category::{handle_category_command, CategoryCommands};
pub use export::{handle_export_command, ExportCommands};
pub use goal::{handle_goal_command, GoalCommands};
pub use movement::{
    handle_expense_command, handle_income_command, handle_movement_command,
    handle_transfer_command, ExpenseArgs, IncomeArgs, MovementCommands, TransferArgs,
};
pub use recurring::{handle_recurring_command, RecurringCommands};
pub use rule::{handle_rule_command, RuleCommands};
pub use scheduled::{handle_scheduled_command, ScheduledCommands};
pub use statement::{handle_statement_command, StatementCommands};

use chrono::{Local, NaiveDate};

use crate::config::Settings;
use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{Currency, Money, YearMonth};

/// Today's date in the local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a date given as `YYYY-MM-DD`, in the configured format, or as
/// `today` / `yesterday`
pub fn parse_date(input: &str, settings: &Settings) -> BilleteraResult<NaiveDate> {
    let input = input.trim();
    match input.to_lowercase().as_str() {
        "today" | "hoy" => return Ok(today()),
        "yesterday" | "ayer" => return Ok(today().pred_opt().unwrap_or_else(today)),
        _ => {}
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, &settings.date_format))
        .map_err(|_| {
            BilleteraError::Validation(format!(
                "Invalid date: '{}'. Use YYYY-MM-DD or {}",
                input, settings.date_format
            ))
        })
}

/// Parse an optional date, defaulting to today
pub fn date_or_today(input: Option<&str>, settings: &Settings) -> BilleteraResult<NaiveDate> {
    match input {
        Some(s) => parse_date(s, settings),
        None => Ok(today()),
    }
}

pub fn parse_money(input: &str) -> BilleteraResult<Money> {
    Money::parse(input).map_err(|e| {
        BilleteraError::Validation(format!(
            "Invalid amount: '{}'. Use a format like '1500' or '1.500,50'. {}",
            input, e
        ))
    })
}

pub fn parse_currency(input: &str) -> BilleteraResult<Currency> {
    Currency::parse(input).ok_or_else(|| {
        BilleteraError::Validation(format!("Invalid currency: '{}'. Valid: ARS, USD", input))
    })
}

pub fn parse_period(input: &str) -> BilleteraResult<YearMonth> {
    YearMonth::parse(input)
        .map_err(|e| BilleteraError::Validation(format!("Invalid period '{}': {}", input, e)))
}

/// Treat an empty or `none` argument as a request to clear a field
pub fn clearable(input: &str) -> Option<&str> {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let settings = Settings::default();
        let expected = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(parse_date("2025-03-09", &settings).unwrap(), expected);
        assert_eq!(parse_date("09/03/2025", &settings).unwrap(), expected);
        assert_eq!(parse_date("today", &settings).unwrap(), today());
        assert!(parse_date("March 9", &settings).unwrap_err().is_validation());
    }

    #[test]
    fn test_parse_money_and_currency() {
        assert_eq!(parse_money("1.500,50").unwrap(), Money::from_cents(150_050));
        assert!(parse_money("abc").is_err());
        assert_eq!(parse_currency("usd").unwrap(), Currency::Usd);
        assert!(parse_currency("EUR").is_err());
    }

    #[test]
    fn test_clearable() {
        assert_eq!(clearable("none"), None);
        assert_eq!(clearable("  "), None);
        assert_eq!(clearable(" Comida "), Some("Comida"));
    }
}
