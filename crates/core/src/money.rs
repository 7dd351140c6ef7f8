//! Exact conversion between dollar-facing decimals and integer cents.
//!
//! Money is stored and compared as integer minor units. The dollar edge uses
//! `rust_decimal::Decimal`; binary floating point never enters either side.
//!
//! Rounding is **half-up** (midpoint away from zero): `$0.005` is one cent,
//! `$0.004` is zero cents. Negative inputs are rejected before rounding, so
//! the tie-break only ever applies to non-negative values.

use core::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{BillingError, BillingResult};
use crate::value_object::ValueObject;

/// Amount in minor currency units (cents).
pub type Cents = u64;

/// Fractional digits carried by dollar-facing values.
pub const DOLLAR_SCALE: u32 = 2;

/// Largest scale (and digit count) a `Decimal` can represent exactly.
const MAX_DECIMAL_DIGITS: i64 = 28;

/// A dollar amount as supplied by a caller.
///
/// `Absent` models a missing value; text is parsed as an exact decimal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DollarInput {
    Absent,
    Decimal(Decimal),
    Text(String),
}

impl ValueObject for DollarInput {}

impl DollarInput {
    /// Parse into an exact decimal.
    ///
    /// Accepts plain (`"4.50"`) and scientific (`"4.5e0"`) notation, ignoring
    /// surrounding whitespace. Input with more precision than `Decimal` can
    /// hold is rejected rather than rounded.
    pub fn to_decimal(&self) -> BillingResult<Decimal> {
        match self {
            DollarInput::Absent => Err(BillingError::invalid_amount("Amount is required")),
            DollarInput::Decimal(d) => Ok(*d),
            DollarInput::Text(raw) => parse_exact(raw.trim()).map_err(|failure| {
                let reason = match failure {
                    ParseFailure::NotANumber => "Amount is not a number",
                    ParseFailure::TooPrecise => "Amount has too many decimal places",
                    ParseFailure::OutOfRange => "Amount is out of range",
                };
                BillingError::invalid_amount(format!("{reason}: {raw:?}"))
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseFailure {
    NotANumber,
    TooPrecise,
    OutOfRange,
}

fn parse_plain(text: &str) -> Result<Decimal, ParseFailure> {
    Decimal::from_str_exact(text).map_err(|_| {
        // `from_str` rounds where `from_str_exact` refuses.
        if Decimal::from_str(text).is_ok() {
            ParseFailure::TooPrecise
        } else {
            ParseFailure::NotANumber
        }
    })
}

/// Parse decimal text without any rounding.
fn parse_exact(text: &str) -> Result<Decimal, ParseFailure> {
    let Some((mantissa, exponent)) = text.split_once(['e', 'E']) else {
        return parse_plain(text);
    };
    let mut value = parse_plain(mantissa)?;
    let exponent: i64 = exponent.parse().map_err(|_| ParseFailure::NotANumber)?;
    if value.is_zero() {
        return Ok(Decimal::ZERO);
    }
    let scale = i64::from(value.scale());

    if exponent <= scale {
        // Only the scale moves; the mantissa digits are kept as-is.
        let new_scale = scale.checked_sub(exponent).ok_or(ParseFailure::TooPrecise)?;
        if new_scale > MAX_DECIMAL_DIGITS {
            return Err(ParseFailure::TooPrecise);
        }
        let new_scale = u32::try_from(new_scale).map_err(|_| ParseFailure::TooPrecise)?;
        value.set_scale(new_scale).map_err(|_| ParseFailure::TooPrecise)?;
        return Ok(value);
    }

    let growth = exponent - scale;
    if growth > MAX_DECIMAL_DIGITS {
        return Err(ParseFailure::OutOfRange);
    }
    value.set_scale(0).map_err(|_| ParseFailure::OutOfRange)?;
    for _ in 0..growth {
        value = value
            .checked_mul(Decimal::TEN)
            .ok_or(ParseFailure::OutOfRange)?;
    }
    Ok(value)
}

impl From<Decimal> for DollarInput {
    fn from(value: Decimal) -> Self {
        DollarInput::Decimal(value)
    }
}

impl From<&str> for DollarInput {
    fn from(value: &str) -> Self {
        DollarInput::Text(value.to_string())
    }
}

impl From<String> for DollarInput {
    fn from(value: String) -> Self {
        DollarInput::Text(value)
    }
}

macro_rules! impl_from_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for DollarInput {
                fn from(value: $t) -> Self {
                    DollarInput::Decimal(Decimal::from(value))
                }
            }
        )*
    };
}

impl_from_integer!(i32, i64, u32, u64);

impl<T: Into<DollarInput>> From<Option<T>> for DollarInput {
    fn from(value: Option<T>) -> Self {
        value.map_or(DollarInput::Absent, Into::into)
    }
}

/// Convert a dollar amount into integer cents.
///
/// Fails with [`BillingError::InvalidAmount`] when the value is absent,
/// unparseable, negative, or too large to represent in cents.
pub fn dollars_to_cents(value: impl Into<DollarInput>) -> BillingResult<Cents> {
    let dollars = value.into().to_decimal()?;
    if dollars < Decimal::ZERO {
        return Err(BillingError::invalid_amount("Amount must be >= 0"));
    }
    // Covers negative zero, which `to_u64` would refuse.
    if dollars.is_zero() {
        return Ok(0);
    }

    dollars
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_u64())
        .ok_or_else(|| BillingError::invalid_amount("Amount is out of range"))
}

/// Convert integer cents into an exact two-place decimal.
pub fn cents_to_dollars(cents: Cents) -> Decimal {
    Decimal::from_i128_with_scale(i128::from(cents), DOLLAR_SCALE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    #[test]
    fn converts_decimal_dollars_to_cents() {
        assert_eq!(dollars_to_cents(dec!(4.50)).unwrap(), 450);
        assert_eq!(dollars_to_cents(dec!(10)).unwrap(), 1000);
        assert_eq!(dollars_to_cents(dec!(0)).unwrap(), 0);
    }

    #[test]
    fn parses_text_exactly() {
        assert_eq!(dollars_to_cents("5.50").unwrap(), 550);
        assert_eq!(dollars_to_cents(" 0.10 ").unwrap(), 10);
        assert_eq!(dollars_to_cents("1.5e1").unwrap(), 1500);
        assert_eq!(dollars_to_cents("1.5E-2").unwrap(), 2);
        assert_eq!(dollars_to_cents("45e-1").unwrap(), 450);
        // 0.1 + 0.2 style drift cannot happen on the decimal path.
        assert_eq!(dollars_to_cents("0.29").unwrap(), 29);
    }

    #[test]
    fn integer_inputs_are_whole_dollars() {
        assert_eq!(dollars_to_cents(7u64).unwrap(), 700);
        assert_eq!(dollars_to_cents(3i32).unwrap(), 300);
    }

    #[test]
    fn rounds_half_up_at_cent_boundary() {
        assert_eq!(dollars_to_cents(dec!(0.005)).unwrap(), 1);
        assert_eq!(dollars_to_cents(dec!(0.015)).unwrap(), 2);
        assert_eq!(dollars_to_cents(dec!(0.025)).unwrap(), 3);
        assert_eq!(dollars_to_cents(dec!(0.004)).unwrap(), 0);
        assert_eq!(dollars_to_cents(dec!(1.999)).unwrap(), 200);
    }

    #[test]
    fn text_below_half_cent_is_not_rounded_up_by_parsing() {
        // 28 fractional digits: representable, stays below the tie.
        assert_eq!(dollars_to_cents("0.0049999999999999999999999999").unwrap(), 0);
        assert_eq!(dollars_to_cents("4.9999999999999999999999999e-3").unwrap(), 0);
    }

    #[test]
    fn text_too_precise_to_represent_is_rejected() {
        // 29 fractional digits would otherwise round to 0.005 and then to a cent.
        for raw in ["0.00499999999999999999999999999", "4.99999999999999999999999999e-30"] {
            let err = dollars_to_cents(raw).unwrap_err();
            assert!(
                matches!(err, BillingError::InvalidAmount(ref m) if m.starts_with("Amount has too many decimal places")),
                "unexpected error for {raw:?}: {err:?}"
            );
        }
    }

    #[test]
    fn malformed_scientific_text_is_rejected() {
        for raw in ["1e", "e5", "1.5e1.2"] {
            let err = dollars_to_cents(raw).unwrap_err();
            assert!(
                matches!(err, BillingError::InvalidAmount(ref m) if m.starts_with("Amount is not a number")),
                "unexpected error for {raw:?}: {err:?}"
            );
        }
        let err = dollars_to_cents("1e99").unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount(ref m) if m.starts_with("Amount is out of range")));
    }

    #[test]
    fn absent_amount_is_rejected() {
        let err = dollars_to_cents(DollarInput::Absent).unwrap_err();
        assert_eq!(err, BillingError::invalid_amount("Amount is required"));

        let err = dollars_to_cents(None::<Decimal>).unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount(_)));
    }

    #[test]
    fn negative_amount_is_rejected() {
        let err = dollars_to_cents(-5i64).unwrap_err();
        assert_eq!(err, BillingError::invalid_amount("Amount must be >= 0"));

        let err = dollars_to_cents("-0.01").unwrap_err();
        assert!(matches!(err, BillingError::InvalidAmount(_)));
    }

    #[test]
    fn negative_zero_is_zero() {
        assert_eq!(dollars_to_cents("-0.00").unwrap(), 0);
        assert_eq!(dollars_to_cents("0e999999999").unwrap(), 0);
    }

    #[test]
    fn non_numeric_text_is_rejected() {
        for raw in ["", "   ", "abc", "4.50 USD"] {
            let err = dollars_to_cents(raw).unwrap_err();
            assert!(
                matches!(err, BillingError::InvalidAmount(ref m) if m.starts_with("Amount is not a number")),
                "unexpected error for {raw:?}: {err:?}"
            );
        }
    }

    #[test]
    fn oversized_amount_is_rejected() {
        let err = dollars_to_cents(Decimal::MAX).unwrap_err();
        assert_eq!(err, BillingError::invalid_amount("Amount is out of range"));
    }

    #[test]
    fn cents_to_dollars_keeps_two_places() {
        let dollars = cents_to_dollars(550);
        assert_eq!(dollars, dec!(5.50));
        assert_eq!(dollars.to_string(), "5.50");
        assert_eq!(cents_to_dollars(0).to_string(), "0.00");
        assert_eq!(cents_to_dollars(7).to_string(), "0.07");
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 512,
            ..ProptestConfig::default()
        })]

        /// Property: converting cents to dollars and back is the identity.
        #[test]
        fn cents_round_trip_exactly(cents in any::<u64>()) {
            prop_assert_eq!(dollars_to_cents(cents_to_dollars(cents)).unwrap(), cents);
        }

        /// Property: the textual rendering of a dollar value round-trips too.
        #[test]
        fn rendered_dollars_round_trip(cents in 0u64..10_000_000_000u64) {
            let rendered = cents_to_dollars(cents).to_string();
            prop_assert_eq!(dollars_to_cents(rendered).unwrap(), cents);
        }
    }
}
