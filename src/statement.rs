//! Credit-card statement periods and installment dates
//!
//! A card with closing day `c` bills a purchase in the statement that closes
//! after it. These functions pick the statement periods offered for a new
//! expense, the default (first unpaid) period, and the dates installments
//! land on.

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{Currency, Money, YearMonth};

/// Upper bound for installments on one purchase
pub const MAX_INSTALLMENTS: u32 = 48;

/// Offsets of the periods offered, relative to the base period
const PERIOD_OFFSETS: std::ops::RangeInclusive<i32> = -1..=4;

/// A statement period offered when entering a credit-card expense
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodOption {
    pub period: YearMonth,
    /// e.g. "March 2025"
    pub label: String,
    /// Months relative to the base period
    pub offset: i32,
    /// A date inside the period, before closing
    pub representative_date: NaiveDate,
}

pub fn validate_closing_day(closing_day: u32) -> BilleteraResult<()> {
    if (1..=31).contains(&closing_day) {
        Ok(())
    } else {
        Err(BilleteraError::Validation(format!(
            "Closing day must be between 1 and 31 (got {})",
            closing_day
        )))
    }
}

pub fn validate_installment_count(count: u32, max: u32) -> BilleteraResult<()> {
    let max = max.clamp(1, MAX_INSTALLMENTS);
    if (1..=max).contains(&count) {
        Ok(())
    } else {
        Err(BilleteraError::Validation(format!(
            "Installments must be between 1 and {} (got {})",
            max, count
        )))
    }
}

/// The period a purchase made `today` is billed in
///
/// On or after the closing day the statement has already closed, so the base
/// moves to the following month.
pub fn base_period(closing_day: u32, today: NaiveDate) -> YearMonth {
    let current = YearMonth::from_date(today);
    if today.day() >= closing_day {
        current.next()
    } else {
        current
    }
}

/// Day `closing_day - 1` of the period (at least the 1st), clamped to the month
pub fn representative_date(period: YearMonth, closing_day: u32) -> NaiveDate {
    period.day(closing_day.saturating_sub(1).max(1))
}

/// The six periods offered for a new expense: one before the base and four after
pub fn statement_periods(closing_day: u32, today: NaiveDate) -> BilleteraResult<Vec<PeriodOption>> {
    validate_closing_day(closing_day)?;
    let base = base_period(closing_day, today);

    Ok(PERIOD_OFFSETS
        .map(|offset| {
            let period = base.offset(offset);
            PeriodOption {
                period,
                label: period.label(),
                offset,
                representative_date: representative_date(period, closing_day),
            }
        })
        .collect())
}

/// Whether a statement has a payment in any currency
pub fn is_paid(period: YearMonth, paid_keys: &HashSet<String>) -> bool {
    Currency::ALL
        .iter()
        .any(|currency| paid_keys.contains(&period.payment_key(*currency)))
}

/// First period from offset 0 onward with no recorded payment
///
/// Falls back to the calendar month of `today` when every candidate is paid.
pub fn first_unpaid_period(
    periods: &[PeriodOption],
    paid_keys: &HashSet<String>,
    today: NaiveDate,
) -> YearMonth {
    periods
        .iter()
        .filter(|option| option.offset >= 0)
        .find(|option| !is_paid(option.period, paid_keys))
        .map(|option| option.period)
        .unwrap_or_else(|| YearMonth::from_date(today))
}

/// Date the first installment of a purchase is charged
///
/// A purchase on or before the closing day lands in the next month, a later
/// one two months ahead. The day is the closing day, clamped to the month.
pub fn first_installment_date(purchase: NaiveDate, closing_day: u32) -> BilleteraResult<NaiveDate> {
    validate_closing_day(closing_day)?;
    let months_ahead = if purchase.day() <= closing_day { 1 } else { 2 };
    Ok(YearMonth::from_date(purchase)
        .offset(months_ahead)
        .day(closing_day))
}

/// Charge dates for every installment, one month apart
pub fn installment_dates(
    purchase: NaiveDate,
    closing_day: u32,
    count: u32,
) -> BilleteraResult<Vec<NaiveDate>> {
    validate_installment_count(count, MAX_INSTALLMENTS)?;
    let first = YearMonth::from_date(first_installment_date(purchase, closing_day)?);
    Ok((0..count as i32)
        .map(|i| first.offset(i).day(closing_day))
        .collect())
}

/// Periods and dates for installments billed from a chosen statement onward
pub fn installments_from_period(
    period: YearMonth,
    closing_day: u32,
    count: u32,
) -> BilleteraResult<Vec<(YearMonth, NaiveDate)>> {
    validate_closing_day(closing_day)?;
    validate_installment_count(count, MAX_INSTALLMENTS)?;
    Ok((0..count as i32)
        .map(|i| {
            let p = period.offset(i);
            (p, representative_date(p, closing_day))
        })
        .collect())
}

/// Per-installment amounts that add back up to `total`
pub fn split_installments(total: Money, count: u32) -> BilleteraResult<Vec<Money>> {
    validate_installment_count(count, MAX_INSTALLMENTS)?;
    if !total.is_positive() {
        return Err(BilleteraError::Validation(format!(
            "Amount must be greater than zero (got {})",
            total
        )));
    }
    Ok(total.split(count))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ym(y: i32, m: u32) -> YearMonth {
        YearMonth::new(y, m).unwrap()
    }

    #[test]
    fn test_periods_before_closing() {
        let periods = statement_periods(20, date(2025, 3, 10)).unwrap();
        assert_eq!(periods.len(), 6);
        assert_eq!(periods[0].period, ym(2025, 2));
        assert_eq!(periods[1].period, ym(2025, 3));
        assert_eq!(periods[1].offset, 0);
        assert_eq!(periods[1].label, "March 2025");
        assert_eq!(periods[1].representative_date, date(2025, 3, 19));
        assert_eq!(periods[5].period, ym(2025, 7));
    }

    #[test]
    fn test_periods_on_closing_day_shift_forward() {
        let periods = statement_periods(10, date(2025, 12, 10)).unwrap();
        let base = periods.iter().find(|p| p.offset == 0).unwrap();
        assert_eq!(base.period, ym(2026, 1));
        assert_eq!(periods[0].period, ym(2025, 12));
    }

    #[test]
    fn test_periods_are_consecutive_for_every_closing_day() {
        let today = date(2024, 1, 31);
        for closing_day in 1..=31 {
            let periods = statement_periods(closing_day, today).unwrap();
            assert_eq!(periods.len(), 6);
            for pair in periods.windows(2) {
                assert_eq!(pair[0].period.next(), pair[1].period);
                assert_eq!(pair[0].offset + 1, pair[1].offset);
            }
            for option in &periods {
                assert!(option.period.contains(option.representative_date));
            }
        }
    }

    #[test]
    fn test_representative_date_clamps() {
        assert_eq!(representative_date(ym(2025, 2), 31), date(2025, 2, 28));
        assert_eq!(representative_date(ym(2024, 2), 31), date(2024, 2, 29));
        assert_eq!(representative_date(ym(2025, 4), 1), date(2025, 4, 1));
        assert_eq!(representative_date(ym(2025, 4), 2), date(2025, 4, 1));
    }

    #[test]
    fn test_invalid_closing_day() {
        assert!(statement_periods(0, date(2025, 1, 1)).unwrap_err().is_validation());
        assert!(first_installment_date(date(2025, 1, 1), 32).unwrap_err().is_validation());
    }

    #[test]
    fn test_first_unpaid_period() {
        let today = date(2025, 3, 10);
        let periods = statement_periods(20, today).unwrap();

        let paid = HashSet::new();
        assert_eq!(first_unpaid_period(&periods, &paid, today), ym(2025, 3));

        // Offset -1 being unpaid doesn't matter
        let paid: HashSet<String> = ["2025-03_ARS".to_string(), "2025-04_USD".to_string()]
            .into_iter()
            .collect();
        assert_eq!(first_unpaid_period(&periods, &paid, today), ym(2025, 5));

        let all: HashSet<String> = periods
            .iter()
            .map(|p| p.period.payment_key(Currency::Ars))
            .collect();
        assert_eq!(first_unpaid_period(&periods, &all, today), ym(2025, 3));
    }

    #[test]
    fn test_first_installment_date() {
        // On or before closing: next month
        assert_eq!(first_installment_date(date(2025, 1, 15), 15).unwrap(), date(2025, 2, 15));
        assert_eq!(first_installment_date(date(2025, 1, 1), 15).unwrap(), date(2025, 2, 15));
        // After closing: two months
        assert_eq!(first_installment_date(date(2025, 1, 16), 15).unwrap(), date(2025, 3, 15));
        // Year boundary
        assert_eq!(first_installment_date(date(2025, 12, 20), 5).unwrap(), date(2026, 2, 5));
        // Clamped into February
        assert_eq!(first_installment_date(date(2025, 1, 10), 30).unwrap(), date(2025, 2, 28));
    }

    #[test]
    fn test_installment_dates_never_overflow_month() {
        let dates = installment_dates(date(2025, 11, 2), 31, 6).unwrap();
        assert_eq!(
            dates,
            vec![
                date(2025, 12, 31),
                date(2026, 1, 31),
                date(2026, 2, 28),
                date(2026, 3, 31),
                date(2026, 4, 30),
                date(2026, 5, 31),
            ]
        );
        for closing_day in 1..=31 {
            for d in installment_dates(date(2024, 1, 20), closing_day, 12).unwrap() {
                assert!(d.day() <= closing_day);
                assert!(d.day() <= YearMonth::from_date(d).days());
            }
        }
    }

    #[test]
    fn test_installment_months_follow_purchase_day() {
        for day in 1..=28 {
            let purchase = date(2025, 5, day);
            let first = YearMonth::from_date(first_installment_date(purchase, 14).unwrap());
            let expected = if day <= 14 { 1 } else { 2 };
            assert_eq!(YearMonth::from_date(purchase).months_until(&first), expected);
        }
    }

    #[test]
    fn test_installments_from_period() {
        let plan = installments_from_period(ym(2025, 11), 5, 3).unwrap();
        assert_eq!(
            plan,
            vec![
                (ym(2025, 11), date(2025, 11, 4)),
                (ym(2025, 12), date(2025, 12, 4)),
                (ym(2026, 1), date(2026, 1, 4)),
            ]
        );
    }

    #[test]
    fn test_installment_count_bounds() {
        assert!(installment_dates(date(2025, 1, 1), 10, 0).is_err());
        assert!(installment_dates(date(2025, 1, 1), 10, 49).is_err());
        assert_eq!(installment_dates(date(2025, 1, 1), 10, 48).unwrap().len(), 48);
        assert!(validate_installment_count(13, 12).is_err());
    }

    #[test]
    fn test_split_sums_to_total() {
        for (cents, count) in [(100_000, 3), (1, 1), (99_999, 48), (1_000, 7), (47, 12)] {
            let parts = split_installments(Money::from_cents(cents), count).unwrap();
            assert_eq!(parts.len(), count as usize);
            assert_eq!(parts.iter().copied().sum::<Money>(), Money::from_cents(cents));
            let max = parts.iter().max().unwrap().cents();
            let min = parts.iter().min().unwrap().cents();
            assert!(max - min <= 1);
        }
        assert_eq!(
            split_installments(Money::from_cents(1_000), 3).unwrap(),
            vec![Money::from_cents(334), Money::from_cents(333), Money::from_cents(333)]
        );
        assert!(split_installments(Money::zero(), 3).is_err());
    }
}
