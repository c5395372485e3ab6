//! Calendar aggregation
//!
//! Lays out one month day by day: posted movements, projected recurring
//! occurrences, pending scheduled transactions and credit-card closings.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{
    AccountId, Currency, Money, MovementId, MovementKind, RecurringId, ScheduledId,
    ScheduledStatus, YearMonth,
};
use crate::storage::Storage;

pub struct CalendarService<'a> {
    storage: &'a Storage,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CalendarEvent {
    Movement {
        movement_id: MovementId,
        kind: MovementKind,
        amount: Money,
        currency: Currency,
        note: String,
    },
    Recurring {
        recurring_id: RecurringId,
        name: String,
        kind: MovementKind,
        amount: Money,
        currency: Currency,
    },
    Scheduled {
        scheduled_id: ScheduledId,
        kind: MovementKind,
        amount: Money,
        currency: Currency,
    },
    StatementClosing {
        account_id: AccountId,
        account_name: String,
    },
}

impl CalendarEvent {
    /// Kind, amount and currency of events that move money
    fn flow(&self) -> Option<(MovementKind, Money, Currency)> {
        match self {
            Self::Movement { kind, amount, currency, .. }
            | Self::Recurring { kind, amount, currency, .. }
            | Self::Scheduled { kind, amount, currency, .. } => Some((*kind, *amount, *currency)),
            Self::StatementClosing { .. } => None,
        }
    }

    pub fn is_projected(&self) -> bool {
        matches!(self, Self::Recurring { .. } | Self::Scheduled { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayTotal {
    pub currency: Currency,
    pub income: Money,
    pub expense: Money,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<CalendarEvent>,
    /// Income and expense per currency, projections included
    pub totals: Vec<DayTotal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub period: YearMonth,
    pub days: Vec<CalendarDay>,
}

impl CalendarMonth {
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.date == date)
    }
}

fn day_totals(events: &[CalendarEvent]) -> Vec<DayTotal> {
    let mut totals: BTreeMap<Currency, DayTotal> = BTreeMap::new();
    for (kind, amount, currency) in events.iter().filter_map(CalendarEvent::flow) {
        let total = totals.entry(currency).or_insert(DayTotal {
            currency,
            income: Money::zero(),
            expense: Money::zero(),
        });
        match kind {
            MovementKind::Income => total.income += amount,
            MovementKind::Expense => total.expense += amount,
            MovementKind::Transfer => {}
        }
    }
    totals.into_values().collect()
}

impl<'a> CalendarService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn month(&self, year: i32, month: u32, today: NaiveDate) -> BilleteraResult<CalendarMonth> {
        let period = YearMonth::new(year, month).ok_or_else(|| {
            BilleteraError::Validation(format!("Invalid month: {}-{}", year, month))
        })?;
        let (start, end) = (period.start_date(), period.end_date());
        let mut by_day: BTreeMap<NaiveDate, Vec<CalendarEvent>> = BTreeMap::new();

        let mut movements = self.storage.movements.get_by_date_range(start, end)?;
        movements.reverse();
        for m in movements {
            by_day.entry(m.date).or_default().push(CalendarEvent::Movement {
                movement_id: m.id,
                kind: m.kind,
                amount: m.amount,
                currency: m.currency,
                note: m.note,
            });
        }

        for template in self.storage.recurring.filter(|r| r.active)? {
            for date in template.occurrences_between(start, end) {
                if template.handled_on(date).is_some() {
                    continue;
                }
                by_day.entry(date).or_default().push(CalendarEvent::Recurring {
                    recurring_id: template.id,
                    name: template.name.clone(),
                    kind: template.kind,
                    amount: template.amount,
                    currency: template.currency,
                });
            }
        }

        for item in self
            .storage
            .scheduled
            .filter(|s| s.status == ScheduledStatus::Pending && period.contains(s.date))?
        {
            by_day.entry(item.date).or_default().push(CalendarEvent::Scheduled {
                scheduled_id: item.id,
                kind: item.kind,
                amount: item.amount,
                currency: item.currency,
            });
        }

        for account in self.storage.accounts.filter(|a| !a.archived)? {
            if let Some(closing_day) = account.statement_closing_day() {
                by_day
                    .entry(period.day(closing_day))
                    .or_default()
                    .push(CalendarEvent::StatementClosing {
                        account_id: account.id,
                        account_name: account.name,
                    });
            }
        }

        let days = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| {
                let events = by_day.remove(&date).unwrap_or_default();
                CalendarDay {
                    date,
                    is_today: date == today,
                    totals: day_totals(&events),
                    events,
                }
            })
            .collect();

        debug!(period = %period, "calendar built");
        Ok(CalendarMonth { period, days })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::paths::BilleteraPaths;
    use crate::models::{
        Account, CreationMode, Frequency, Movement, RecurringTransaction, ScheduledTransaction,
    };
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let paths = BilleteraPaths::with_base_dir(temp_dir.path().to_path_buf());
        let storage = Storage::new(paths).unwrap();
        storage.load_all().unwrap();
        (temp_dir, storage)
    }

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_month_layout() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CalendarService::new(&storage);
        let bank = Account::new("Banco", Currency::Ars);
        let card = Account::credit_card("Visa", Currency::Ars, 31);
        storage.accounts.upsert(bank.clone()).unwrap();
        storage.accounts.upsert(card.clone()).unwrap();

        storage
            .movements
            .upsert(Movement::income(bank.id, date(2, 3), Money::from_cents(1_000), Currency::Ars))
            .unwrap();
        storage
            .movements
            .upsert(Movement::expense(bank.id, date(2, 3), Money::from_cents(400), Currency::Ars))
            .unwrap();
        storage
            .movements
            .upsert(Movement::expense(bank.id, date(3, 3), Money::from_cents(1), Currency::Ars))
            .unwrap();

        let template = RecurringTransaction::new(
            "Gimnasio",
            MovementKind::Expense,
            Money::from_cents(300),
            Currency::Ars,
            bank.id,
            Frequency::Weekly,
            date(2, 1),
            CreationMode::Confirm,
        );
        storage.recurring.upsert(template).unwrap();

        let mut scheduled = ScheduledTransaction::new(
            MovementKind::Income,
            bank.id,
            date(2, 20),
            Money::from_cents(5_000),
            Currency::Ars,
        );
        scheduled.note = "Aguinaldo".into();
        storage.scheduled.upsert(scheduled).unwrap();

        let month = service.month(2025, 2, date(2, 3)).unwrap();
        assert_eq!(month.days.len(), 28);

        let third = month.day(date(2, 3)).unwrap();
        assert!(third.is_today);
        assert_eq!(third.events.len(), 2);
        assert_eq!(
            third.totals,
            vec![DayTotal {
                currency: Currency::Ars,
                income: Money::from_cents(1_000),
                expense: Money::from_cents(400),
            }]
        );

        let recurring_days: Vec<_> = month
            .days
            .iter()
            .filter(|d| d.events.iter().any(|e| matches!(e, CalendarEvent::Recurring { .. })))
            .map(|d| d.date)
            .collect();
        assert_eq!(recurring_days, vec![date(2, 1), date(2, 8), date(2, 15), date(2, 22)]);

        assert!(month.day(date(2, 20)).unwrap().events[0].is_projected());
        assert!(matches!(
            month.day(date(2, 28)).unwrap().events[0],
            CalendarEvent::StatementClosing { .. }
        ));
    }

    #[test]
    fn test_invalid_month() {
        let (_temp_dir, storage) = create_test_storage();
        let service = CalendarService::new(&storage);
        assert!(service.month(2025, 13, date(1, 1)).unwrap_err().is_validation());
    }
}
