//! Price validation and comparison helpers.
//!
//! Raw retailer prices arrive as floats. Everything downstream of
//! [`validate_price`] works in `Decimal` at two decimal places so that
//! equality checks and percent math are exact.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Upper bound on a plausible listing price, in dollars.
pub const MAX_PRICE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Percent changes outside this magnitude are clamped before storage.
pub const MAX_PERCENT_CHANGE: Decimal = Decimal::from_parts(99_999_999, 0, 0, false, 2);

/// Two prices within one cent of each other are treated as unchanged.
const CENT: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Validates a raw price and normalizes it to two decimal places.
///
/// Rejects non-finite values, negatives, and anything above [`MAX_PRICE`].
/// Zero is accepted: a free promotional listing is unusual but not invalid.
#[must_use]
pub fn validate_price(raw: f64) -> Option<Decimal> {
    if !raw.is_finite() {
        return None;
    }
    let price = Decimal::from_f64_retain(raw)?
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    if price.is_sign_negative() || price > MAX_PRICE {
        return None;
    }
    Some(price)
}

/// Whether two stored prices differ by less than a cent.
#[must_use]
pub fn prices_equal(a: Decimal, b: Decimal) -> bool {
    (a - b).abs() < CENT
}

/// Percent change from `old` to `new`, clamped to ±[`MAX_PERCENT_CHANGE`].
///
/// Returns `None` when `old` is zero, since the change is undefined.
#[must_use]
pub fn percent_change(old: Decimal, new: Decimal) -> Option<Decimal> {
    if old.is_zero() {
        return None;
    }
    let pct = ((new - old) / old * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    Some(pct.clamp(-MAX_PERCENT_CHANGE, MAX_PERCENT_CHANGE))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(c: i64) -> Decimal {
        Decimal::new(c, 2)
    }

    #[test]
    fn validate_rounds_to_cents() {
        assert_eq!(validate_price(199.999), Some(cents(20000)));
        assert_eq!(validate_price(149.955), Some(cents(14996)));
    }

    #[test]
    fn validate_accepts_zero() {
        assert_eq!(validate_price(0.0), Some(cents(0)));
    }

    #[test]
    fn validate_rejects_out_of_range() {
        assert_eq!(validate_price(-0.01), None);
        assert_eq!(validate_price(1_000_000.0), None);
        assert_eq!(validate_price(f64::NAN), None);
        assert_eq!(validate_price(f64::INFINITY), None);
    }

    #[test]
    fn validate_accepts_boundary() {
        assert_eq!(validate_price(999_999.99), Some(MAX_PRICE));
    }

    #[test]
    fn prices_within_a_cent_are_equal() {
        assert!(prices_equal(cents(19999), cents(19999)));
        assert!(prices_equal(cents(19999), Decimal::new(199_995, 3)));
        assert!(!prices_equal(cents(19999), cents(20000)));
    }

    #[test]
    fn percent_change_basic() {
        assert_eq!(percent_change(cents(20000), cents(15000)), Some(cents(-2500)));
        assert_eq!(percent_change(cents(10000), cents(13333)), Some(cents(3333)));
    }

    #[test]
    fn percent_change_undefined_from_zero() {
        assert_eq!(percent_change(cents(0), cents(5000)), None);
    }

    #[test]
    fn percent_change_clamped() {
        assert_eq!(
            percent_change(cents(1), cents(99_999_999)),
            Some(MAX_PERCENT_CHANGE)
        );
    }
}
