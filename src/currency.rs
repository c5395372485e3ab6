//! Currency formatting and conversion
//!
//! Conversions use a static rate table kept in the settings: the number of
//! pesos one dollar buys. Amounts render in the Argentine style, with `.`
//! grouping thousands and `,` before the cents.

use serde::{Deserialize, Serialize};

use crate::error::{BilleteraError, BilleteraResult};
use crate::models::{Currency, Money};

/// Static exchange-rate table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRates {
    /// Pesos per US dollar
    pub ars_per_usd: f64,
}

impl Default for ExchangeRates {
    fn default() -> Self {
        Self { ars_per_usd: 1000.0 }
    }
}

impl ExchangeRates {
    pub fn new(ars_per_usd: f64) -> Self {
        Self { ars_per_usd }
    }

    /// Value of one unit of `currency` in pesos
    fn in_ars(&self, currency: Currency) -> f64 {
        match currency {
            Currency::Ars => 1.0,
            Currency::Usd => self.ars_per_usd,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.ars_per_usd.is_finite() && self.ars_per_usd > 0.0
    }
}

/// Convert an amount between currencies
pub fn convert(amount: f64, from: Currency, to: Currency, rates: &ExchangeRates) -> f64 {
    if from == to {
        return amount;
    }
    amount * rates.in_ars(from) / rates.in_ars(to)
}

/// Convert a money amount, rounding to the nearest cent
///
/// Fails when the rate table is not a positive finite number or the result
/// does not fit in a [`Money`].
pub fn convert_money(
    amount: Money,
    from: Currency,
    to: Currency,
    rates: &ExchangeRates,
) -> BilleteraResult<Money> {
    if from == to {
        return Ok(amount);
    }
    if !rates.is_valid() {
        return Err(BilleteraError::Validation(format!(
            "Invalid exchange rate: {} ARS per USD",
            rates.ars_per_usd
        )));
    }
    Money::from_f64(convert(amount.as_f64(), from, to, rates)).ok_or_else(|| {
        BilleteraError::Validation(format!(
            "{} {} is too large to convert to {}",
            amount, from, to
        ))
    })
}

/// Render an amount with its currency symbol, e.g. `$ 1.234,56` or `US$ -20,00`
pub fn format_amount(amount: Money, currency: Currency) -> String {
    let sign = if amount.is_negative() { "-" } else { "" };
    format!(
        "{} {}{},{:02}",
        currency.symbol(),
        sign,
        group_thousands(amount.units().abs()),
        amount.cents_part()
    )
}

fn group_thousands(value: i64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Money::from_cents(123_456), Currency::Ars), "$ 1.234,56");
        assert_eq!(format_amount(Money::from_cents(5), Currency::Usd), "US$ 0,05");
        assert_eq!(
            format_amount(Money::from_cents(-123_456_789), Currency::Ars),
            "$ -1.234.567,89"
        );
        assert_eq!(format_amount(Money::from_cents(100_000), Currency::Ars), "$ 1.000,00");
    }

    #[test]
    fn test_convert() {
        let rates = ExchangeRates::new(1200.0);
        assert_eq!(convert(10.0, Currency::Usd, Currency::Ars, &rates), 12_000.0);
        assert_eq!(convert(600.0, Currency::Ars, Currency::Usd, &rates), 0.5);
        assert_eq!(convert(7.0, Currency::Ars, Currency::Ars, &rates), 7.0);
        assert_eq!(
            convert_money(Money::from_cents(2_000), Currency::Usd, Currency::Ars, &rates).unwrap(),
            Money::from_cents(2_400_000)
        );
    }

    #[test]
    fn test_convert_money_rejects_bad_rates() {
        let amount = Money::from_cents(1_000);
        for rate in [0.0, -5.0, f64::NAN, f64::INFINITY] {
            let rates = ExchangeRates::new(rate);
            assert!(!rates.is_valid());
            assert!(convert_money(amount, Currency::Ars, Currency::Usd, &rates)
                .unwrap_err()
                .is_validation());
        }

        // same-currency amounts never touch the rate
        let zero = ExchangeRates::new(0.0);
        assert_eq!(convert_money(amount, Currency::Usd, Currency::Usd, &zero).unwrap(), amount);
    }

    #[test]
    fn test_convert_money_rejects_overflow() {
        let rates = ExchangeRates::new(1e12);
        let err = convert_money(Money::from_cents(1_000_000_000), Currency::Usd, Currency::Ars, &rates)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_round_trip_is_stable() {
        let rates = ExchangeRates::new(1137.5);
        for amount in [0.01, 1.0, 99.99, 12_345.67, 1e9] {
            for (a, b) in [(Currency::Ars, Currency::Usd), (Currency::Usd, Currency::Ars)] {
                let back = convert(convert(amount, a, b, &rates), b, a, &rates);
                assert!((back - amount).abs() <= amount.abs() * 1e-12, "{} -> {}", amount, back);
            }
        }
    }
}
