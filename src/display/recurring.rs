//! Recurring and scheduled transaction display formatting

use chrono::NaiveDate;

use crate::currency::format_amount;
use crate::models::{CreationMode, ScheduledTransaction};
use crate::services::recurring::{PendingOccurrence, RecurringStats};

use super::{truncate, Names};

/// Format recurring templates with their next date and history
pub fn format_recurring_list(stats: &[RecurringStats], names: &Names) -> String {
    if stats.is_empty() {
        return "No recurring transactions.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:12}  {:24}  {:8}  {:>16}  {:14}  {:10}  {:>5}\n",
        "ID", "Name", "Kind", "Amount", "Frequency", "Next", "Done"
    ));
    output.push_str(&"-".repeat(104));
    output.push('\n');

    for s in stats {
        let r = &s.recurring;
        let next = match (r.active, s.next_date) {
            (false, _) => "paused".to_string(),
            (true, Some(date)) => date.format("%Y-%m-%d").to_string(),
            (true, None) => "ended".to_string(),
        };
        let mode = match r.creation_mode {
            CreationMode::Auto => " auto",
            CreationMode::Confirm => "",
        };
        output.push_str(&format!(
            "{:12}  {:24}  {:8}  {:>16}  {:14}  {:10}  {:>5}{}\n",
            r.id.to_string(),
            truncate(&r.name, 24),
            r.kind.to_string(),
            format_amount(r.amount, r.currency),
            r.frequency.to_string(),
            next,
            s.confirmed_count,
            mode
        ));
        if s.pending_count > 0 {
            output.push_str(&format!(
                "{:14}{} pending in {}\n",
                "",
                s.pending_count,
                names.account(r.account_id)
            ));
        }
    }

    output
}

/// Format occurrences waiting for confirmation
pub fn format_pending_occurrences(pending: &[PendingOccurrence]) -> String {
    if pending.is_empty() {
        return "Nothing pending.\n".to_string();
    }

    let mut output = String::new();
    for p in pending {
        output.push_str(&format!(
            "  {}  {:24}  {:8}  {:>16}  [{}]\n",
            p.date.format("%Y-%m-%d"),
            truncate(&p.name, 24),
            p.kind.to_string(),
            format_amount(p.amount, p.currency),
            p.recurring_id
        ));
    }
    output
}

/// Format scheduled transactions; overdue pending items are flagged
pub fn format_scheduled_list(
    items: &[ScheduledTransaction],
    names: &Names,
    today: NaiveDate,
) -> String {
    if items.is_empty() {
        return "No scheduled transactions.\n".to_string();
    }

    let mut output = String::new();
    for item in items {
        let accounts = match item.destination_account_id {
            Some(to) => format!("{} → {}", names.account(item.account_id), names.account(to)),
            None => names.account(item.account_id),
        };
        let mut flags = Vec::new();
        if item.requires_approval {
            flags.push("approval");
        }
        if item.is_pending() && item.is_due(today) {
            flags.push("due");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!("  ({})", flags.join(", "))
        };

        output.push_str(&format!(
            "{:12}  {}  {:8}  {:>16}  {:9}  {}{}\n",
            item.id.to_string(),
            item.date.format("%Y-%m-%d"),
            item.kind.to_string(),
            format_amount(item.amount, item.currency),
            item.status.to_string(),
            truncate(&accounts, 32),
            flags
        ));
        if !item.note.is_empty() {
            output.push_str(&format!("{:14}{}\n", "", item.note));
        }
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AccountId, Currency, Frequency, Money, MovementKind, RecurringId, RecurringTransaction,
    };

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_recurring_list() {
        let mut template = RecurringTransaction::new(
            "Alquiler",
            MovementKind::Expense,
            Money::from_cents(45_000_000),
            Currency::Ars,
            AccountId::new(),
            Frequency::monthly(),
            date(1, 10),
            CreationMode::Auto,
        );
        let stats = vec![RecurringStats {
            recurring: template.clone(),
            next_date: Some(date(4, 10)),
            pending_count: 0,
            confirmed_count: 3,
            total_generated: Money::from_cents(135_000_000),
        }];
        let output = format_recurring_list(&stats, &Names::default());
        assert!(output.contains("Alquiler"));
        assert!(output.contains("2025-04-10"));
        assert!(output.contains("auto"));

        template.active = false;
        let paused = vec![RecurringStats {
            recurring: template,
            next_date: Some(date(4, 10)),
            pending_count: 0,
            confirmed_count: 3,
            total_generated: Money::zero(),
        }];
        assert!(format_recurring_list(&paused, &Names::default()).contains("paused"));
    }

    #[test]
    fn test_pending_occurrences() {
        let pending = vec![PendingOccurrence {
            recurring_id: RecurringId::new(),
            name: "Netflix".into(),
            date: date(3, 5),
            kind: MovementKind::Expense,
            amount: Money::from_cents(999),
            currency: Currency::Usd,
        }];
        let output = format_pending_occurrences(&pending);
        assert!(output.contains("2025-03-05"));
        assert!(output.contains("US$ 9,99"));
        assert!(format_pending_occurrences(&[]).contains("Nothing pending"));
    }

    #[test]
    fn test_scheduled_due_flag() {
        let mut item = ScheduledTransaction::new(
            MovementKind::Income,
            AccountId::new(),
            date(3, 1),
            Money::from_cents(100),
            Currency::Ars,
        );
        item.requires_approval = true;
        let output = format_scheduled_list(&[item], &Names::default(), date(3, 2));
        assert!(output.contains("(approval, due)"));
    }
}
