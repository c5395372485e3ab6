//! Calendar display formatting
//!
//! Renders a month as a weekday grid with markers on busy days, followed
//! by the agenda of every day that has events.

use chrono::Datelike;

use crate::currency::format_amount;
use crate::services::calendar::{CalendarEvent, CalendarMonth};

use super::truncate;

fn event_line(event: &CalendarEvent) -> String {
    match event {
        CalendarEvent::Movement {
            kind,
            amount,
            currency,
            note,
            ..
        } => format!(
            "{:8}  {:>16}  {}",
            kind.to_string(),
            format_amount(*amount, *currency),
            truncate(note, 30)
        ),
        CalendarEvent::Recurring {
            name,
            kind,
            amount,
            currency,
            ..
        } => format!(
            "{:8}  {:>16}  {} (recurring)",
            kind.to_string(),
            format_amount(*amount, *currency),
            truncate(name, 30)
        ),
        CalendarEvent::Scheduled {
            kind,
            amount,
            currency,
            ..
        } => format!(
            "{:8}  {:>16}  (scheduled)",
            kind.to_string(),
            format_amount(*amount, *currency)
        ),
        CalendarEvent::StatementClosing { account_name, .. } => {
            format!("Closing   {} statement", account_name)
        }
    }
}

/// Format a month grid and its agenda
pub fn format_calendar_month(month: &CalendarMonth) -> String {
    let mut output = String::new();
    output.push_str(&format!("{:^28}\n", month.period.label()));
    output.push_str(" Mo  Tu  We  Th  Fr  Sa  Su\n");

    let Some(first) = month.days.first() else {
        return output;
    };
    let lead = first.date.weekday().num_days_from_monday() as usize;
    output.push_str(&"    ".repeat(lead));

    for (i, day) in month.days.iter().enumerate() {
        let marker = if day.is_today {
            '<'
        } else if day.events.is_empty() {
            ' '
        } else if day.events.iter().all(CalendarEvent::is_projected) {
            '~'
        } else {
            '*'
        };
        output.push_str(&format!("{:>3}{}", day.date.day(), marker));
        if (lead + i + 1) % 7 == 0 {
            output.push('\n');
        }
    }
    if !output.ends_with('\n') {
        output.push('\n');
    }

    for day in month.days.iter().filter(|d| !d.events.is_empty()) {
        output.push('\n');
        output.push_str(&format!("{}\n", day.date.format("%a %d")));
        for event in &day.events {
            output.push_str(&format!("  {}\n", event_line(event)));
        }
        for total in &day.totals {
            output.push_str(&format!(
                "  = {} +{} -{}\n",
                total.currency,
                format_amount(total.income, total.currency),
                format_amount(total.expense, total.currency)
            ));
        }
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AccountId, Currency, Money, MovementId, MovementKind, YearMonth};
    use crate::services::calendar::{CalendarDay, DayTotal};
    use chrono::NaiveDate;

    #[test]
    fn test_grid_and_agenda() {
        let period = YearMonth::new(2025, 9).unwrap();
        let card = AccountId::new();

        let days = period
            .start_date()
            .iter_days()
            .take_while(|d| *d <= period.end_date())
            .map(|date| {
                let events = match date.day() {
                    2 => vec![CalendarEvent::Movement {
                        movement_id: MovementId::new(),
                        kind: MovementKind::Expense,
                        amount: Money::from_cents(2_500),
                        currency: Currency::Ars,
                        note: "Cafe".into(),
                    }],
                    25 => vec![CalendarEvent::StatementClosing {
                        account_id: card,
                        account_name: "Visa".into(),
                    }],
                    _ => vec![],
                };
                let totals = if date.day() == 2 {
                    vec![DayTotal {
                        currency: Currency::Ars,
                        income: Money::zero(),
                        expense: Money::from_cents(2_500),
                    }]
                } else {
                    vec![]
                };
                CalendarDay {
                    date,
                    is_today: date.day() == 10,
                    events,
                    totals,
                }
            })
            .collect();
        let month = CalendarMonth { period, days };

        let output = format_calendar_month(&month);
        assert!(output.contains("September 2025"));
        // 2025-09-01 is a Monday
        assert!(output.contains("\n  1   2*"));
        assert!(output.contains(" 10<"));
        assert!(output.contains("Cafe"));
        assert!(output.contains("Closing   Visa statement"));
        assert!(output.contains("-$ 25,00"));
    }
}
