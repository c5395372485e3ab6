//! Money and currency types
//!
//! Amounts are stored in cents (i64) to avoid floating-point precision
//! issues. The currency travels next to the amount on each entity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// Currencies supported by the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// Argentine peso
    #[default]
    Ars,
    /// US dollar
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 2] = [Currency::Ars, Currency::Usd];

    /// ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ars => "ARS",
            Self::Usd => "USD",
        }
    }

    /// Symbol used when rendering amounts
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Ars => "$",
            Self::Usd => "US$",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "ARS" | "PESOS" | "$" => Some(Self::Ars),
            "USD" | "DOLARES" | "DÓLARES" | "US$" | "U$S" => Some(Self::Usd),
            _ => None,
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Represents a monetary amount stored as cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use billetera::models::Money;
    /// let amount = Money::from_cents(1050); // 10.50
    /// assert_eq!(amount.units(), 10);
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units and cents
    pub const fn from_units_cents(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    /// Largest magnitude, in cents, accepted from user input and conversions
    pub const MAX_CENTS: i64 = 1_000_000_000_000_000;

    /// Create a Money amount from a float, rounding to the nearest cent
    ///
    /// Returns `None` for NaN, infinities and values beyond [`Money::MAX_CENTS`].
    pub fn from_f64(value: f64) -> Option<Self> {
        let cents = (value * 100.0).round();
        if !cents.is_finite() || cents.abs() > Self::MAX_CENTS as f64 {
            return None;
        }
        Some(Self(cents as i64))
    }

    pub const fn zero() -> Self {
        Self(0)
    }

    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// The cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub const fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Parse a money amount from a string
    ///
    /// Accepts "1500", "1500.50", "1500,50", "$1.500,50", "US$ 20", "-10.5".
    /// When both separators appear, the last one is the decimal separator.
    pub fn parse(s: &str) -> Result<Self, MoneyParseError> {
        let original = s.trim();

        let (negative, rest) = match original.strip_prefix('-') {
            Some(stripped) => (true, stripped),
            None => (false, original),
        };

        let rest = rest
            .trim_start_matches("US$")
            .trim_start_matches("U$S")
            .trim_start_matches('$')
            .trim();

        if rest.is_empty() {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let last_dot = rest.rfind('.');
        let last_comma = rest.rfind(',');
        let decimal_pos = match (last_dot, last_comma) {
            (Some(d), Some(c)) => Some(d.max(c)),
            (Some(d), None) => {
                // "1.500" is a thousands separator, "1.5" / "1.50" is decimal
                if rest.matches('.').count() == 1 && rest.len() - d - 1 <= 2 {
                    Some(d)
                } else {
                    None
                }
            }
            (None, Some(c)) => {
                if rest.matches(',').count() == 1 && rest.len() - c - 1 <= 2 {
                    Some(c)
                } else {
                    None
                }
            }
            (None, None) => None,
        };

        let (int_part, frac_part) = match decimal_pos {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => (rest, ""),
        };

        let int_digits: String = int_part.chars().filter(|c| *c != '.' && *c != ',').collect();
        if int_digits.is_empty() && frac_part.is_empty() {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }
        if !int_digits.chars().all(|c| c.is_ascii_digit())
            || !frac_part.chars().all(|c| c.is_ascii_digit())
        {
            return Err(MoneyParseError::InvalidFormat(original.to_string()));
        }

        let units: i64 = if int_digits.is_empty() {
            0
        } else {
            int_digits
                .parse()
                .map_err(|_| MoneyParseError::InvalidFormat(original.to_string()))?
        };

        let cents: i64 = match frac_part.len() {
            0 => 0,
            1 => frac_part.parse::<i64>().unwrap_or(0) * 10,
            2 => frac_part.parse().unwrap_or(0),
            _ => return Err(MoneyParseError::InvalidFormat(original.to_string())),
        };

        let total = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .filter(|v| *v <= Self::MAX_CENTS)
            .ok_or_else(|| MoneyParseError::OutOfRange(original.to_string()))?;

        Ok(Self(if negative { -total } else { total }))
    }

    /// Split into `parts` amounts that add back up to `self`
    ///
    /// Every part gets `self / parts`; the leftover cents go one each to the
    /// leading parts.
    pub fn split(&self, parts: u32) -> Vec<Money> {
        if parts == 0 {
            return Vec::new();
        }
        let parts_i = parts as i64;
        let base = self.0 / parts_i;
        let remainder = self.0 % parts_i;
        (0..parts_i)
            .map(|i| {
                let extra = if i < remainder.abs() { remainder.signum() } else { 0 };
                Money(base + extra)
            })
            .collect()
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            write!(f, "{}.{:02}", self.units(), self.cents_part())
        }
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_add(other.0);
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }
}

impl SubAssign for Money {
    fn sub_assign(&mut self, other: Self) {
        self.0 = self.0.saturating_sub(other.0);
    }
}

impl Neg for Money {
    type Output = Self;

    fn neg(self) -> Self {
        Self(self.0.saturating_neg())
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

/// Error type for money parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoneyParseError {
    InvalidFormat(String),
    OutOfRange(String),
}

impl fmt::Display for MoneyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoneyParseError::InvalidFormat(s) => write!(f, "Invalid money format: {}", s),
            MoneyParseError::OutOfRange(s) => write!(f, "Amount out of range: {}", s),
        }
    }
}

impl std::error::Error for MoneyParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.units(), 10);
        assert_eq!(m.cents_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1050).to_string(), "10.50");
        assert_eq!(Money::from_cents(-1050).to_string(), "-10.50");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
    }

    #[test]
    fn test_parse() {
        assert_eq!(Money::parse("10.50").unwrap().cents(), 1050);
        assert_eq!(Money::parse("10,5").unwrap().cents(), 1050);
        assert_eq!(Money::parse("$1.500,25").unwrap().cents(), 150025);
        assert_eq!(Money::parse("1,500.25").unwrap().cents(), 150025);
        assert_eq!(Money::parse("1.500").unwrap().cents(), 150000);
        assert_eq!(Money::parse("US$ 20").unwrap().cents(), 2000);
        assert_eq!(Money::parse("-10").unwrap().cents(), -1000);
        assert!(Money::parse("abc").is_err());
        assert!(Money::parse("").is_err());
        assert!(Money::parse("$").is_err());
    }

    #[test]
    fn test_parse_rejects_extra_decimals() {
        assert_eq!(
            Money::parse("1,234.567"),
            Err(MoneyParseError::InvalidFormat("1,234.567".into()))
        );
        assert!(Money::parse("1.234,567").is_err());
        assert_eq!(Money::parse("1,234.56").unwrap().cents(), 123_456);
    }

    #[test]
    fn test_parse_rejects_huge_amounts() {
        assert!(matches!(
            Money::parse("99999999999999999"),
            Err(MoneyParseError::OutOfRange(_))
        ));
        assert!(Money::parse("99999999999999999999999").is_err());
        assert_eq!(
            Money::parse("10000000000000").unwrap().cents(),
            Money::MAX_CENTS
        );
    }

    #[test]
    fn test_from_f64_rejects_non_finite() {
        assert_eq!(Money::from_f64(10.25), Some(Money::from_cents(1025)));
        assert_eq!(Money::from_f64(f64::INFINITY), None);
        assert_eq!(Money::from_f64(f64::NAN), None);
        assert_eq!(Money::from_f64(1e300), None);
    }

    #[test]
    fn test_arithmetic_saturates() {
        let huge = Money::from_cents(i64::MAX);
        assert_eq!(huge + Money::from_cents(1), huge);
        assert_eq!(Money::from_cents(i64::MIN) - Money::from_cents(1), Money::from_cents(i64::MIN));
        assert_eq!([huge, huge, huge].into_iter().sum::<Money>(), huge);
        assert_eq!(-Money::from_cents(i64::MIN), huge);
    }

    #[test]
    fn test_split_sums_to_total() {
        let total = Money::from_cents(10000);
        let parts = total.split(3);
        assert_eq!(parts, vec![
            Money::from_cents(3334),
            Money::from_cents(3333),
            Money::from_cents(3333),
        ]);
        assert_eq!(parts.iter().copied().sum::<Money>(), total);

        for count in 1..=48u32 {
            let total = Money::from_cents(123_457);
            let parts = total.split(count);
            assert_eq!(parts.len(), count as usize);
            assert_eq!(parts.into_iter().sum::<Money>(), total);
        }
    }

    #[test]
    fn test_split_zero_parts() {
        assert!(Money::from_cents(100).split(0).is_empty());
    }

    #[test]
    fn test_currency_parse() {
        assert_eq!(Currency::parse("usd"), Some(Currency::Usd));
        assert_eq!(Currency::parse("ARS"), Some(Currency::Ars));
        assert_eq!(Currency::parse("eur"), None);
        assert_eq!(serde_json::to_string(&Currency::Usd).unwrap(), "\"USD\"");
    }
}
