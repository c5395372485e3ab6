//! Calendar month periods
//!
//! A `YearMonth` identifies a credit-card statement period, a budget month
//! or a calendar page. It renders and parses as `YYYY-MM`.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::money::Currency;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Number of days in the given month
pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

/// Build a date, clamping the day to the month's last day
pub fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let day = day.clamp(1, days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Shift a date by whole calendar months, clamping the day of month
pub fn add_months_clamped(date: NaiveDate, months: i32) -> Option<NaiveDate> {
    let ym = YearMonth::from_date(date).offset(months);
    clamped_date(ym.year, ym.month, date.day())
}

/// A calendar month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    /// Create a period; `None` when the month is out of range
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// The month containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The current month in local time
    pub fn current() -> Self {
        Self::from_date(chrono::Local::now().date_naive())
    }

    /// Shift by a number of months (negative goes back)
    pub fn offset(&self, months: i32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months;
        Self {
            year: index.div_euclid(12),
            month: (index.rem_euclid(12) + 1) as u32,
        }
    }

    pub fn next(&self) -> Self {
        self.offset(1)
    }

    pub fn prev(&self) -> Self {
        self.offset(-1)
    }

    /// Months from `self` to `other` (positive when `other` is later)
    pub fn months_until(&self, other: &YearMonth) -> i32 {
        (other.year - self.year) * 12 + (other.month as i32 - self.month as i32)
    }

    pub fn days(&self) -> u32 {
        days_in_month(self.year, self.month)
    }

    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    /// Last day of the month (inclusive)
    pub fn end_date(&self) -> NaiveDate {
        self.start_date() + Duration::days(self.days() as i64 - 1)
    }

    /// A day within this month, clamped to the month length
    pub fn day(&self, day: u32) -> NaiveDate {
        clamped_date(self.year, self.month, day).unwrap_or_else(|| self.start_date())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// Human label, e.g. "March 2025"
    pub fn label(&self) -> String {
        format!("{} {}", MONTH_NAMES[(self.month - 1) as usize], self.year)
    }

    /// Key used to look up statement payments, e.g. "2025-03_ARS"
    pub fn payment_key(&self, currency: Currency) -> String {
        format!("{}_{}", self, currency.code())
    }

    /// Parse "YYYY-MM"
    pub fn parse(s: &str) -> Result<Self, PeriodParseError> {
        let s = s.trim();
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| PeriodParseError::InvalidFormat(s.to_string()))?;

        let year: i32 = year
            .parse()
            .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodParseError::InvalidFormat(s.to_string()))?;

        Self::new(year, month).ok_or(PeriodParseError::InvalidMonth(month))
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        YearMonth::parse(&value)
    }
}

/// Error type for period parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PeriodParseError {
    InvalidFormat(String),
    InvalidMonth(u32),
}

impl fmt::Display for PeriodParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeriodParseError::InvalidFormat(s) => {
                write!(f, "Invalid period format: {} (expected YYYY-MM)", s)
            }
            PeriodParseError::InvalidMonth(m) => write!(f, "Invalid month: {}", m),
        }
    }
}

impl std::error::Error for PeriodParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2025, 2), 28);
        assert_eq!(days_in_month(2025, 12), 31);
        assert_eq!(days_in_month(2025, 4), 30);
    }

    #[test]
    fn test_offset_crosses_years() {
        let jan = YearMonth::new(2025, 1).unwrap();
        assert_eq!(jan.prev(), YearMonth::new(2024, 12).unwrap());
        assert_eq!(jan.offset(13), YearMonth::new(2026, 2).unwrap());
        assert_eq!(jan.offset(-25), YearMonth::new(2022, 12).unwrap());
        assert_eq!(jan.months_until(&jan.offset(7)), 7);
    }

    #[test]
    fn test_bounds() {
        let feb = YearMonth::new(2024, 2).unwrap();
        assert_eq!(feb.start_date(), date(2024, 2, 1));
        assert_eq!(feb.end_date(), date(2024, 2, 29));
        assert_eq!(feb.day(31), date(2024, 2, 29));
        assert!(feb.contains(date(2024, 2, 15)));
        assert!(!feb.contains(date(2024, 3, 1)));
    }

    #[test]
    fn test_add_months_clamped() {
        assert_eq!(add_months_clamped(date(2025, 1, 31), 1), Some(date(2025, 2, 28)));
        assert_eq!(add_months_clamped(date(2025, 11, 15), 3), Some(date(2026, 2, 15)));
    }

    #[test]
    fn test_parse_and_display() {
        let period = YearMonth::parse("2025-03").unwrap();
        assert_eq!(period.to_string(), "2025-03");
        assert_eq!(period.label(), "March 2025");
        assert_eq!(period.payment_key(Currency::Usd), "2025-03_USD");
        assert_eq!(YearMonth::parse("2025-13"), Err(PeriodParseError::InvalidMonth(13)));
        assert!(YearMonth::parse("March").is_err());
    }

    #[test]
    fn test_serialization_as_string() {
        let period = YearMonth::new(2025, 7).unwrap();
        let json = serde_json::to_string(&period).unwrap();
        assert_eq!(json, "\"2025-07\"");
        let back: YearMonth = serde_json::from_str(&json).unwrap();
        assert_eq!(back, period);
    }
}
