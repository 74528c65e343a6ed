//! Arithmetic helpers shared by the tax adapters.

use rust_decimal::Decimal;

use crate::error::{EngineError, EngineResult};

/// Rounds a value to 2 decimal places, half away from zero.
///
/// # Examples
///
/// ```
/// use tax_engine::calculation::round_half_up;
/// use rust_decimal::Decimal;
///
/// assert_eq!(round_half_up(Decimal::new(13335, 3)), Decimal::new(1334, 2));
/// assert_eq!(round_half_up(Decimal::new(-13335, 3)), Decimal::new(-1334, 2));
/// ```
pub fn round_half_up(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero)
}

/// Applies a whole-number percentage to an amount: `percent_of(200, 20) == 40`.
///
/// The rate is scaled down first so amounts up to `Decimal::MAX` cannot
/// overflow the intermediate product.
pub fn percent_of(amount: Decimal, rate: Decimal) -> Decimal {
    amount * (rate / Decimal::ONE_HUNDRED)
}

/// Tax as a percentage of its base, rounded to 2 places.
///
/// Returns zero when the base is zero or negative.
pub fn effective_rate(tax: Decimal, base: Decimal) -> Decimal {
    if base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    round_half_up(tax / base * Decimal::ONE_HUNDRED)
}

/// Largest magnitude accepted for any input amount (10^15).
pub fn max_amount() -> Decimal {
    Decimal::new(1_000_000_000_000_000, 0)
}

/// Rejects amounts whose magnitude exceeds [`max_amount`].
///
/// Rates in the tables are at most 100 and amounts are multiplied by a
/// handful of them, so anything under the limit stays far inside
/// `Decimal`'s range.
pub fn checked_amount(field: &str, value: Decimal) -> EngineResult<Decimal> {
    if value.abs() > max_amount() {
        return Err(EngineError::InvalidInput {
            field: field.to_string(),
            message: format!("must not exceed {} in magnitude", max_amount()),
        });
    }
    Ok(value)
}

/// Checks an optional amount. `None` stays `None`: nothing was entered.
pub fn checked_input(field: &str, value: Option<Decimal>) -> EngineResult<Option<Decimal>> {
    value.map(|v| checked_amount(field, v)).transpose()
}

/// Rejects a caller-supplied percentage outside 0 to 100.
pub fn checked_percentage(field: &str, value: Decimal) -> EngineResult<Decimal> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(EngineError::InvalidInput {
            field: field.to_string(),
            message: "must be a percentage between 0 and 100".to_string(),
        });
    }
    Ok(value)
}

/// Clamps an amount to zero or above.
pub fn non_negative(value: Decimal) -> Decimal {
    value.max(Decimal::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_round_half_up_midpoints() {
        assert_eq!(round_half_up(dec("2.345")), dec("2.35"));
        assert_eq!(round_half_up(dec("2.344")), dec("2.34"));
        assert_eq!(round_half_up(dec("-2.345")), dec("-2.35"));
        assert_eq!(round_half_up(dec("100")), dec("100"));
    }

    #[test]
    fn test_percent_of() {
        assert_eq!(percent_of(dec("200"), dec("20")), dec("40"));
        assert_eq!(percent_of(dec("100"), dec("8.75")), dec("8.75"));
        assert_eq!(percent_of(dec("0"), dec("45")), Decimal::ZERO);
        assert_eq!(percent_of(Decimal::MAX, dec("100")), Decimal::MAX);
    }

    #[test]
    fn test_effective_rate_blended() {
        assert_eq!(effective_rate(dec("200000"), dec("1500000")), dec("13.33"));
        assert_eq!(effective_rate(dec("11432"), dec("60000")), dec("19.05"));
    }

    #[test]
    fn test_effective_rate_zero_base() {
        assert_eq!(effective_rate(dec("10"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(effective_rate(dec("10"), dec("-5")), Decimal::ZERO);
    }

    #[test]
    fn test_checked_amount_limits() {
        assert!(checked_amount("income", dec("999999999999999")).is_ok());
        assert!(checked_amount("income", dec("-1000000000000000")).is_ok());

        match checked_amount("income", dec("1000000000000001")) {
            Err(EngineError::InvalidInput { field, .. }) => assert_eq!(field, "income"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_checked_input_passes_none_through() {
        assert_eq!(checked_input("income", None).unwrap(), None);
        assert_eq!(checked_input("income", Some(dec("5"))).unwrap(), Some(dec("5")));
    }

    #[test]
    fn test_checked_percentage_range() {
        assert_eq!(checked_percentage("discount", dec("25")).unwrap(), dec("25"));
        assert!(checked_percentage("discount", dec("100")).is_ok());
        assert!(checked_percentage("discount", dec("-1")).is_err());
        assert!(checked_percentage("discount", dec("100.5")).is_err());
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(dec("-3")), Decimal::ZERO);
        assert_eq!(non_negative(dec("3")), dec("3"));
    }
}
