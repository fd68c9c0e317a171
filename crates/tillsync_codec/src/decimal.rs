//! Fixed-point amounts on the wire.
//!
//! Amounts are held as [`Decimal`] locally but travel as JSON numbers
//! (IEEE-754 doubles) truncated to their scale. Decoding rounds the double
//! back to the same scale, so `12.50` arrives as exactly `12.50` even when
//! the sender produced `12.499999999`.

use crate::error::{CodecError, CodecResult};
use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use serde_json::{Number, Value};
use std::fmt;
use std::str::FromStr;

/// Fractional digits carried by monetary amounts.
pub const MONEY_SCALE: u32 = 2;

/// Fractional digits carried by rates (tax, service charge).
pub const RATE_SCALE: u32 = 4;

fn normalize(value: Decimal, scale: u32) -> Decimal {
    let mut value = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
    value.rescale(scale);
    value
}

fn encode_scaled(value: Decimal, scale: u32) -> Value {
    let truncated = value.round_dp_with_strategy(scale, RoundingStrategy::ToZero);
    truncated
        .to_f64()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn decode_scaled(value: &Value, scale: u32) -> CodecResult<Decimal> {
    let decimal = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                n.as_f64().and_then(Decimal::from_f64)
            }
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    };

    decimal
        .map(|d| normalize(d, scale))
        .ok_or_else(|| CodecError::invalid_value(format!("expected a decimal amount, got {value}")))
}

/// A monetary amount with two fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Money(Decimal);

impl Money {
    /// Zero.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates an amount from minor units (cents).
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, MONEY_SCALE))
    }

    /// Creates an amount from a decimal, rounding to two places.
    pub fn from_decimal(value: Decimal) -> Self {
        Self(normalize(value, MONEY_SCALE))
    }

    /// Returns the underlying decimal.
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Encodes the amount as a wire number.
    pub fn to_wire(&self) -> Value {
        encode_scaled(self.0, MONEY_SCALE)
    }

    /// Decodes an amount from a wire number (or numeric string).
    pub fn from_wire(value: &Value) -> CodecResult<Self> {
        decode_scaled(value, MONEY_SCALE).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rate with four fractional digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Rate(Decimal);

impl Rate {
    /// Creates a rate from ten-thousandths (basis points times one hundredth).
    pub fn from_ten_thousandths(units: i64) -> Self {
        Self(Decimal::new(units, RATE_SCALE))
    }

    /// Creates a rate from a decimal, rounding to four places.
    pub fn from_decimal(value: Decimal) -> Self {
        Self(normalize(value, RATE_SCALE))
    }

    /// Returns the underlying decimal.
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Encodes the rate as a wire number.
    pub fn to_wire(&self) -> Value {
        encode_scaled(self.0, RATE_SCALE)
    }

    /// Decodes a rate from a wire number (or numeric string).
    pub fn from_wire(value: &Value) -> CodecResult<Self> {
        decode_scaled(value, RATE_SCALE).map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn money_survives_the_wire() {
        let price = Money::from_cents(1250);
        let wire = price.to_wire();
        assert_eq!(wire, json!(12.5));

        let back = Money::from_wire(&wire).unwrap();
        assert_eq!(back, price);
        assert_eq!(back.to_string(), "12.50");
    }

    #[test]
    fn float_noise_is_rounded_away() {
        let back = Money::from_wire(&json!(12.499999999999)).unwrap();
        assert_eq!(back.to_string(), "12.50");

        let back = Money::from_wire(&json!(0.1 + 0.2)).unwrap();
        assert_eq!(back, Money::from_cents(30));
    }

    #[test]
    fn encoding_truncates_extra_digits() {
        let value = Money(Decimal::new(12_999, 3));
        assert_eq!(value.to_wire(), json!(12.99));
    }

    #[test]
    fn integers_and_strings_are_accepted() {
        assert_eq!(Money::from_wire(&json!(7)).unwrap(), Money::from_cents(700));
        assert_eq!(Money::from_wire(&json!("3.10")).unwrap(), Money::from_cents(310));
        assert!(Money::from_wire(&json!(true)).is_err());
        assert!(Money::from_wire(&json!("abc")).is_err());
    }

    #[test]
    fn rates_keep_four_places() {
        let rate = Rate::from_ten_thousandths(825);
        let back = Rate::from_wire(&rate.to_wire()).unwrap();
        assert_eq!(back.value().to_string(), "0.0825");
    }
}
