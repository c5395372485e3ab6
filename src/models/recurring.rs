//! Recurring transaction model
//!
//! A recurring transaction is a template that produces income or expense
//! movements on a schedule. Depending on its creation mode, due occurrences
//! are either created automatically or wait for the user to confirm them.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{AccountId, CategoryId, MovementId, RecurringId};
use super::money::{Currency, Money};
use super::movement::MovementKind;
use super::period::{clamped_date, YearMonth};

/// Hard stop when walking a schedule
const MAX_OCCURRENCES: i64 = 10_000;

/// How often a recurring transaction repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    /// Monthly on `day` (defaults to the start date's day); clamps in short months
    Monthly {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        day: Option<u32>,
    },
    Yearly,
    CustomDays { days: u32 },
}

impl Frequency {
    pub fn monthly() -> Self {
        Self::Monthly { day: None }
    }

    pub fn monthly_on(day: u32) -> Self {
        Self::Monthly { day: Some(day) }
    }

    /// Parse "daily", "weekly", "biweekly", "monthly", "monthly:15", "yearly", "every:10"
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        let (head, arg) = match s.split_once(':') {
            Some((h, a)) => (h.to_string(), Some(a.to_string())),
            None => (s, None),
        };

        match (head.as_str(), arg) {
            ("daily", None) => Some(Self::Daily),
            ("weekly", None) => Some(Self::Weekly),
            ("biweekly", None) => Some(Self::Biweekly),
            ("monthly", None) => Some(Self::monthly()),
            ("monthly", Some(day)) => day.parse().ok().map(Self::monthly_on),
            ("yearly", None) => Some(Self::Yearly),
            ("every" | "custom_days", Some(days)) => {
                days.parse().ok().map(|days| Self::CustomDays { days })
            }
            _ => None,
        }
    }

    fn fixed_step_days(&self) -> Option<i64> {
        match self {
            Self::Daily => Some(1),
            Self::Weekly => Some(7),
            Self::Biweekly => Some(14),
            Self::CustomDays { days } => Some(*days as i64),
            Self::Monthly { .. } | Self::Yearly => None,
        }
    }

    /// The n-th candidate date of a schedule anchored at `start`
    ///
    /// Monthly schedules with an explicit day may produce a first candidate
    /// before `start`; callers filter those out.
    fn nth(&self, start: NaiveDate, n: i64) -> Option<NaiveDate> {
        match self {
            Self::Monthly { day } => {
                let ym = YearMonth::from_date(start).offset(n as i32);
                clamped_date(ym.year, ym.month, day.unwrap_or(start.day()))
            }
            Self::Yearly => clamped_date(start.year() + n as i32, start.month(), start.day()),
            _ => {
                let step = self.fixed_step_days()?;
                start.checked_add_signed(Duration::days(step * n))
            }
        }
    }

    /// All occurrences of a schedule starting at `start` within `[from, to]`
    pub fn occurrences_between(&self, start: NaiveDate, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let mut dates = Vec::new();
        if to < from || to < start {
            return dates;
        }

        // Jump close to `from` for fixed-step schedules
        let mut n = match self.fixed_step_days() {
            Some(step) if step > 0 && from > start => (from - start).num_days() / step,
            _ => 0,
        };
        if let Self::Monthly { .. } = self {
            if from > start {
                n = (YearMonth::from_date(start)
                    .months_until(&YearMonth::from_date(from))
                    .max(1)
                    - 1) as i64;
            }
        }
        if let Self::Yearly = self {
            if from > start {
                n = ((from.year() - start.year()).max(1) - 1) as i64;
            }
        }

        let limit = n + MAX_OCCURRENCES;
        while n < limit {
            let Some(date) = self.nth(start, n) else {
                break;
            };
            n += 1;
            if date > to {
                break;
            }
            if date >= start && date >= from {
                dates.push(date);
            }
        }
        dates
    }

    /// First occurrence strictly after `after`
    pub fn next_after(&self, start: NaiveDate, after: NaiveDate) -> Option<NaiveDate> {
        let from = after.succ_opt()?.max(start);
        // A year is enough to contain the next occurrence of any supported schedule,
        // except custom intervals longer than that.
        let horizon = match self {
            Self::CustomDays { days } => (*days as i64).max(366) + 1,
            _ => 400,
        };
        self.occurrences_between(start, from, from + Duration::days(horizon))
            .into_iter()
            .next()
    }

    pub fn validate(&self) -> Result<(), RecurringValidationError> {
        match self {
            Self::CustomDays { days } if *days == 0 => Err(RecurringValidationError::ZeroInterval),
            Self::Monthly { day: Some(day) } if !(1..=31).contains(day) => {
                Err(RecurringValidationError::InvalidDay(*day))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily => write!(f, "Daily"),
            Self::Weekly => write!(f, "Weekly"),
            Self::Biweekly => write!(f, "Every 2 weeks"),
            Self::Monthly { day: None } => write!(f, "Monthly"),
            Self::Monthly { day: Some(day) } => write!(f, "Monthly on day {}", day),
            Self::Yearly => write!(f, "Yearly"),
            Self::CustomDays { days } => write!(f, "Every {} days", days),
        }
    }
}

/// What happens when an occurrence comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CreationMode {
    /// Create the movement without asking
    Auto,
    /// Wait for the user to confirm each occurrence
    #[default]
    Confirm,
}

impl CreationMode {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "automatic" => Some(Self::Auto),
            "confirm" | "manual" => Some(Self::Confirm),
            _ => None,
        }
    }
}

impl fmt::Display for CreationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::Confirm => write!(f, "confirm"),
        }
    }
}

/// Outcome of an occurrence that has been dealt with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum OccurrenceStatus {
    Confirmed { movement_id: MovementId },
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceRecord {
    pub date: NaiveDate,
    #[serde(flatten)]
    pub status: OccurrenceStatus,
}

/// A recurring income or expense template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: RecurringId,
    pub name: String,
    pub kind: MovementKind,
    pub amount: Money,
    pub currency: Currency,
    pub account_id: AccountId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<CategoryId>,
    #[serde(default)]
    pub note: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub creation_mode: CreationMode,
    #[serde(default = "default_active")]
    pub active: bool,
    /// Occurrences that were confirmed or skipped
    #[serde(default)]
    pub handled: Vec<OccurrenceRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl RecurringTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<String>,
        kind: MovementKind,
        amount: Money,
        currency: Currency,
        account_id: AccountId,
        frequency: Frequency,
        start_date: NaiveDate,
        creation_mode: CreationMode,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: RecurringId::new(),
            name: name.into(),
            kind,
            amount,
            currency,
            account_id,
            category_id: None,
            note: String::new(),
            frequency,
            start_date,
            end_date: None,
            creation_mode,
            active: true,
            handled: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Occurrences within `[from, to]`, bounded by the end date
    pub fn occurrences_between(&self, from: NaiveDate, to: NaiveDate) -> Vec<NaiveDate> {
        let to = match self.end_date {
            Some(end) => to.min(end),
            None => to,
        };
        self.frequency.occurrences_between(self.start_date, from, to)
    }

    pub fn is_occurrence(&self, date: NaiveDate) -> bool {
        self.occurrences_between(date, date).contains(&date)
    }

    pub fn handled_on(&self, date: NaiveDate) -> Option<&OccurrenceRecord> {
        self.handled.iter().find(|record| record.date == date)
    }

    /// Unhandled occurrences up to and including `today`
    pub fn pending(&self, today: NaiveDate) -> Vec<NaiveDate> {
        if !self.active {
            return Vec::new();
        }
        self.occurrences_between(self.start_date, today)
            .into_iter()
            .filter(|date| self.handled_on(*date).is_none())
            .collect()
    }

    /// First unhandled occurrence on or after `today`
    pub fn next_due(&self, today: NaiveDate) -> Option<NaiveDate> {
        if !self.active {
            return None;
        }
        let mut cursor = today.pred_opt()?;
        for _ in 0..MAX_OCCURRENCES {
            let next = self.frequency.next_after(self.start_date, cursor)?;
            if let Some(end) = self.end_date {
                if next > end {
                    return None;
                }
            }
            if self.handled_on(next).is_none() {
                return Some(next);
            }
            cursor = next;
        }
        None
    }

    pub fn confirmed_count(&self) -> usize {
        self.handled
            .iter()
            .filter(|r| matches!(r.status, OccurrenceStatus::Confirmed { .. }))
            .count()
    }

    pub fn record(&mut self, date: NaiveDate, status: OccurrenceStatus) {
        self.handled.retain(|r| r.date != date);
        self.handled.push(OccurrenceRecord { date, status });
        self.handled.sort_by_key(|r| r.date);
        self.updated_at = Utc::now();
    }

    pub fn validate(&self) -> Result<(), RecurringValidationError> {
        if self.name.trim().is_empty() {
            return Err(RecurringValidationError::EmptyName);
        }
        if !self.amount.is_positive() {
            return Err(RecurringValidationError::NonPositiveAmount(self.amount));
        }
        if self.kind == MovementKind::Transfer {
            return Err(RecurringValidationError::TransferNotSupported);
        }
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(RecurringValidationError::EndBeforeStart);
            }
        }
        self.frequency.validate()
    }
}

impl fmt::Display for RecurringTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {} {}, {})",
            self.name, self.kind, self.amount, self.currency, self.frequency
        )
    }
}

/// Validation errors for recurring transactions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecurringValidationError {
    EmptyName,
    NonPositiveAmount(Money),
    TransferNotSupported,
    EndBeforeStart,
    ZeroInterval,
    InvalidDay(u32),
}

impl fmt::Display for RecurringValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Name cannot be empty"),
            Self::NonPositiveAmount(amount) => {
                write!(f, "Amount must be greater than zero (got {})", amount)
            }
            Self::TransferNotSupported => {
                write!(f, "Recurring transactions must be income or expense")
            }
            Self::EndBeforeStart => write!(f, "End date cannot be before the start date"),
            Self::ZeroInterval => write!(f, "Custom interval must be at least one day"),
            Self::InvalidDay(day) => write!(f, "Day of month must be between 1 and 31 (got {})", day),
        }
    }
}

impl std::error::Error for RecurringValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn template(frequency: Frequency, start: NaiveDate) -> RecurringTransaction {
        RecurringTransaction::new(
            "Alquiler",
            MovementKind::Expense,
            Money::from_cents(250_000),
            Currency::Ars,
            AccountId::new(),
            frequency,
            start,
            CreationMode::Confirm,
        )
    }

    #[test]
    fn test_weekly_occurrences() {
        let dates = Frequency::Weekly.occurrences_between(
            date(2025, 1, 1),
            date(2025, 1, 10),
            date(2025, 1, 31),
        );
        assert_eq!(
            dates,
            vec![date(2025, 1, 15), date(2025, 1, 22), date(2025, 1, 29)]
        );
    }

    #[test]
    fn test_monthly_clamps_short_months() {
        let dates = Frequency::monthly().occurrences_between(
            date(2025, 1, 31),
            date(2025, 1, 1),
            date(2025, 4, 30),
        );
        assert_eq!(
            dates,
            vec![
                date(2025, 1, 31),
                date(2025, 2, 28),
                date(2025, 3, 31),
                date(2025, 4, 30)
            ]
        );
    }

    #[test]
    fn test_monthly_with_day_skips_candidate_before_start() {
        let dates = Frequency::monthly_on(5).occurrences_between(
            date(2025, 1, 20),
            date(2025, 1, 1),
            date(2025, 3, 31),
        );
        assert_eq!(dates, vec![date(2025, 2, 5), date(2025, 3, 5)]);
    }

    #[test]
    fn test_yearly_leap_day() {
        let dates = Frequency::Yearly.occurrences_between(
            date(2024, 2, 29),
            date(2024, 1, 1),
            date(2026, 12, 31),
        );
        assert_eq!(
            dates,
            vec![date(2024, 2, 29), date(2025, 2, 28), date(2026, 2, 28)]
        );
    }

    #[test]
    fn test_next_after() {
        let next = Frequency::CustomDays { days: 10 }.next_after(date(2025, 1, 1), date(2025, 1, 11));
        assert_eq!(next, Some(date(2025, 1, 21)));

        let next = Frequency::monthly().next_after(date(2025, 1, 15), date(2024, 12, 1));
        assert_eq!(next, Some(date(2025, 1, 15)));
    }

    #[test]
    fn test_parse_frequency() {
        assert_eq!(Frequency::parse("monthly:10"), Some(Frequency::monthly_on(10)));
        assert_eq!(Frequency::parse("every:3"), Some(Frequency::CustomDays { days: 3 }));
        assert_eq!(Frequency::parse("Weekly"), Some(Frequency::Weekly));
        assert_eq!(Frequency::parse("hourly"), None);
    }

    #[test]
    fn test_frequency_serialization_is_tagged() {
        let json = serde_json::to_value(Frequency::CustomDays { days: 3 }).unwrap();
        assert_eq!(json["type"], "custom_days");
        assert_eq!(json["days"], 3);
    }

    #[test]
    fn test_pending_and_next_due() {
        let mut rec = template(Frequency::monthly(), date(2025, 1, 10));
        let today = date(2025, 3, 15);
        assert_eq!(
            rec.pending(today),
            vec![date(2025, 1, 10), date(2025, 2, 10), date(2025, 3, 10)]
        );

        rec.record(date(2025, 1, 10), OccurrenceStatus::Skipped);
        rec.record(
            date(2025, 2, 10),
            OccurrenceStatus::Confirmed { movement_id: MovementId::new() },
        );
        assert_eq!(rec.pending(today), vec![date(2025, 3, 10)]);
        assert_eq!(rec.confirmed_count(), 1);
        assert_eq!(rec.next_due(today), Some(date(2025, 4, 10)));

        rec.end_date = Some(date(2025, 3, 31));
        assert_eq!(rec.next_due(today), None);
    }

    #[test]
    fn test_validation() {
        let mut rec = template(Frequency::CustomDays { days: 0 }, date(2025, 1, 1));
        assert_eq!(rec.validate(), Err(RecurringValidationError::ZeroInterval));

        rec.frequency = Frequency::Daily;
        rec.kind = MovementKind::Transfer;
        assert_eq!(rec.validate(), Err(RecurringValidationError::TransferNotSupported));
    }
}
