//! Credit-card statement display formatting

use std::collections::HashSet;

use crate::currency::format_amount;
use crate::models::{Account, StatementPayment};
use crate::services::statement::StatementSummary;
use crate::statement::{is_paid, PeriodOption};

/// Format a statement with per-currency totals and the payments made
pub fn format_statement_summary(
    account: &Account,
    summary: &StatementSummary,
    payments: &[StatementPayment],
) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Statement {} - {}\n",
        summary.period.label(),
        account.name
    ));
    output.push_str(&format!(
        "  Closes:    {}\n",
        summary.closing_date.format("%Y-%m-%d")
    ));
    output.push_str(&format!("  Movements: {}\n", summary.movement_count));
    output.push('\n');

    if summary.totals.is_empty() {
        output.push_str("  Nothing charged in this period.\n");
    }
    for total in &summary.totals {
        let state = if total.outstanding.is_positive() {
            "DUE"
        } else {
            "PAID"
        };
        output.push_str(&format!(
            "  {}  charged {:>16}  paid {:>16}  outstanding {:>16}  {}\n",
            total.currency,
            format_amount(total.charged, total.currency),
            format_amount(total.paid, total.currency),
            format_amount(total.outstanding, total.currency),
            state
        ));
    }

    let in_period: Vec<_> = payments
        .iter()
        .filter(|p| p.period == summary.period)
        .collect();
    if !in_period.is_empty() {
        output.push_str("\nPayments:\n");
        for payment in in_period {
            output.push_str(&format!(
                "  {}  {}\n",
                payment.date.format("%Y-%m-%d"),
                format_amount(payment.amount, payment.currency)
            ));
        }
    }

    output
}

/// Format the statement periods offered for a card, marking paid ones
pub fn format_period_options(options: &[PeriodOption], paid_keys: &HashSet<String>) -> String {
    let mut output = String::new();
    for option in options {
        let marker = if option.offset == 0 { "*" } else { " " };
        let paid = if is_paid(option.period, paid_keys) {
            "  (paid)"
        } else {
            ""
        };
        output.push_str(&format!(
            "{} {}  {:16}{}\n",
            marker, option.period, option.label, paid
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, Money, YearMonth};
    use crate::services::statement::StatementTotal;
    use chrono::NaiveDate;

    #[test]
    fn test_statement_summary() {
        let card = Account::credit_card("Visa", Currency::Ars, 25);
        let period = YearMonth::new(2025, 3).unwrap();
        let summary = StatementSummary {
            account_id: card.id,
            period,
            closing_date: NaiveDate::from_ymd_opt(2025, 3, 25).unwrap(),
            movement_count: 3,
            totals: vec![StatementTotal {
                currency: Currency::Ars,
                charged: Money::from_cents(30_000),
                paid: Money::from_cents(10_000),
                outstanding: Money::from_cents(20_000),
            }],
        };
        let payment = StatementPayment::new(
            card.id,
            period,
            Currency::Ars,
            Money::from_cents(10_000),
            NaiveDate::from_ymd_opt(2025, 4, 5).unwrap(),
        );

        let output = format_statement_summary(&card, &summary, &[payment]);
        assert!(output.contains("Statement March 2025 - Visa"));
        assert!(output.contains("DUE"));
        assert!(output.contains("2025-04-05"));
    }

    #[test]
    fn test_period_options_mark_paid() {
        let period = YearMonth::new(2025, 3).unwrap();
        let options = vec![PeriodOption {
            period,
            label: period.label(),
            offset: 0,
            representative_date: NaiveDate::from_ymd_opt(2025, 3, 24).unwrap(),
        }];
        let mut paid = HashSet::new();
        paid.insert(period.payment_key(Currency::Ars));

        let output = format_period_options(&options, &paid);
        assert!(output.starts_with("* 2025-03"));
        assert!(output.contains("(paid)"));
    }
}
