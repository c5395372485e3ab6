//! Account display formatting
//!
//! Formats accounts and their balances for terminal output.

use crate::currency::format_amount;
use crate::models::{Currency, Money};
use crate::services::account::AccountSummary;

use super::truncate;

/// Format a list of accounts with balances and per-currency totals
pub fn format_account_list(summaries: &[AccountSummary]) -> String {
    if summaries.is_empty() {
        return "No accounts found.".to_string();
    }

    let name_width = summaries
        .iter()
        .map(|s| s.account.name.chars().count())
        .max()
        .unwrap_or(7)
        .clamp(7, 30);

    let mut output = String::new();
    output.push_str(&format!(
        "{:12}  {:name_width$}  {:8}  {:>18}  {:>6}\n",
        "ID",
        "Account",
        "Type",
        "Balance",
        "Movs",
        name_width = name_width
    ));
    output.push_str(&"-".repeat(name_width + 54));
    output.push('\n');

    for summary in summaries {
        let account = &summary.account;
        let kind = match account.closing_day {
            Some(day) if account.is_credit_card => format!("Card/{}", day),
            _ => "Account".to_string(),
        };
        let archived = if account.archived { " (archived)" } else { "" };
        output.push_str(&format!(
            "{:12}  {:name_width$}  {:8}  {:>18}  {:>6}{}\n",
            account.id.to_string(),
            truncate(&account.name, name_width),
            kind,
            format_amount(summary.balance, account.currency),
            summary.movement_count,
            archived,
            name_width = name_width
        ));
    }

    output.push_str(&"-".repeat(name_width + 54));
    output.push('\n');
    for currency in Currency::ALL {
        let in_currency: Vec<_> = summaries
            .iter()
            .filter(|s| s.account.currency == currency && !s.account.archived)
            .collect();
        if in_currency.is_empty() {
            continue;
        }
        let total: Money = in_currency.iter().map(|s| s.balance).sum();
        output.push_str(&format!(
            "TOTAL {:3}  {:>width$}\n",
            currency.code(),
            format_amount(total, currency),
            width = name_width + 30
        ));
    }

    output
}

/// Format a single account's details
pub fn format_account_details(summary: &AccountSummary) -> String {
    let account = &summary.account;
    let mut output = String::new();

    output.push_str(&format!("Account: {}\n", account.name));
    output.push_str(&format!("  ID:        {}\n", account.id));
    output.push_str(&format!("  Currency:  {}\n", account.currency));
    if let Some(day) = account.statement_closing_day() {
        output.push_str(&format!("  Card:      closes on day {}\n", day));
    }
    output.push_str(&format!(
        "  Archived:  {}\n",
        if account.archived { "Yes" } else { "No" }
    ));
    output.push('\n');
    output.push_str(&format!(
        "  Initial Balance: {}\n",
        format_amount(account.initial_balance, account.currency)
    ));
    output.push_str(&format!(
        "  Current Balance: {}\n",
        format_amount(summary.balance, account.currency)
    ));
    output.push_str(&format!("  Movements:       {}\n", summary.movement_count));

    output.push('\n');
    output.push_str(&format!(
        "  Created:  {}\n",
        account.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "  Modified: {}\n",
        account.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output
}
