//! Money helpers.
//!
//! Amounts are `Decimal` values with two fractional digits in the API and
//! integer cents in the database. Conversions refuse anything that would lose
//! precision instead of rounding silently.

use crate::errors::{Error, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Number of fractional digits kept for currency values.
pub const CURRENCY_SCALE: u32 = 2;

/// Converts integer cents to a two-place decimal.
#[must_use]
pub fn from_cents(cents: i64) -> Decimal {
    Decimal::new(cents, CURRENCY_SCALE)
}

/// Converts a decimal amount to integer cents.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the amount has more than two
/// fractional digits or does not fit in an `i64` number of cents.
pub fn to_cents(amount: Decimal) -> Result<i64> {
    if amount.round_dp(CURRENCY_SCALE) != amount {
        return Err(Error::InvalidAmount {
            amount: amount.to_string(),
        });
    }
    (amount * Decimal::ONE_HUNDRED)
        .to_i64()
        .ok_or_else(|| Error::InvalidAmount {
            amount: amount.to_string(),
        })
}

/// Parses a user-typed price such as `"1299.99"` or `"$899"`.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] if the text is not a non-negative number
/// with at most two fractional digits.
pub fn parse_price(input: &str) -> Result<Decimal> {
    let trimmed = input.trim().trim_start_matches('$').replace(',', "");
    let amount = Decimal::from_str(&trimmed).map_err(|_| Error::InvalidAmount {
        amount: input.trim().to_string(),
    })?;
    if amount.is_sign_negative() {
        return Err(Error::InvalidAmount {
            amount: amount.to_string(),
        });
    }
    to_cents(amount)?;
    Ok(amount.round_dp(CURRENCY_SCALE))
}

/// Multiplies a unit price by a quantity.
///
/// # Errors
/// Returns [`Error::InvalidAmount`] on overflow.
pub fn line_subtotal_cents(unit_price_cents: i64, quantity: i32) -> Result<i64> {
    unit_price_cents
        .checked_mul(i64::from(quantity))
        .ok_or_else(|| Error::InvalidAmount {
            amount: format!("{} x {quantity}", from_cents(unit_price_cents)),
        })
}

/// Divides `total` by `count`, rounding half away from zero to two places.
/// Returns zero for an empty count.
#[must_use]
pub fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        return Decimal::ZERO;
    }
    (total / Decimal::from(count))
        .round_dp_with_strategy(CURRENCY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// `part` as a percentage of `whole`, rounded half away from zero to `dp` places.
/// Returns zero when `whole` is zero.
#[must_use]
pub fn percentage(part: Decimal, whole: Decimal, dp: u32) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part * Decimal::ONE_HUNDRED / whole)
        .round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero)
}

/// Formats an amount as dollars, e.g. `$1299.99`.
#[must_use]
pub fn format_money(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(CURRENCY_SCALE))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_cents_conversion() {
        assert_eq!(from_cents(129_999), Decimal::new(129_999, 2));
        assert_eq!(to_cents(Decimal::new(129_999, 2)).unwrap(), 129_999);
        assert_eq!(to_cents(Decimal::from(15)).unwrap(), 1500);
    }

    #[test]
    fn test_to_cents_rejects_sub_cent_precision() {
        let result = to_cents(Decimal::new(1_2345, 4));
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_parse_price() {
        assert_eq!(parse_price("1299.99").unwrap(), Decimal::new(129_999, 2));
        assert_eq!(parse_price(" $1,099 ").unwrap(), Decimal::from(1099));
        assert!(parse_price("abc").is_err());
        assert!(parse_price("-5").is_err());
        assert!(parse_price("10.005").is_err());
    }

    #[test]
    fn test_line_subtotal() {
        assert_eq!(line_subtotal_cents(129_999, 2).unwrap(), 259_998);
        assert!(line_subtotal_cents(i64::MAX, 2).is_err());
    }

    #[test]
    fn test_average_rounds_half_up() {
        assert_eq!(average(Decimal::from(10), 3), Decimal::new(333, 2));
        assert_eq!(average(Decimal::new(1001, 2), 2), Decimal::new(501, 2));
        assert_eq!(average(Decimal::from(10), 0), Decimal::ZERO);
    }

    #[test]
    fn test_percentage() {
        assert_eq!(
            percentage(Decimal::from(1), Decimal::from(3), 2),
            Decimal::new(3333, 2)
        );
        assert_eq!(percentage(Decimal::from(1), Decimal::ZERO, 2), Decimal::ZERO);
    }

    #[test]
    fn test_format_money() {
        assert_eq!(format_money(Decimal::new(129_999, 2)), "$1299.99");
        assert_eq!(format_money(Decimal::from(5)), "$5.00");
    }
}
