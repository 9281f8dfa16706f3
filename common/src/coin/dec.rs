use std::{
    fmt::{Display, Error, Formatter},
    str::FromStr,
};

use primitive_types::U256;
use serde::de::Error as SerdeError;
use serde::{Deserialize, Serialize};

use crate::error::DecError;

// Number of decimals carried by a Dec
pub const DEC_PRECISION: u32 = 18;

const PRECISION_MULTIPLIER: i128 = 1_000_000_000_000_000_000;

/// Signed fixed point decimal with 18 digits of precision.
///
/// Prices (base fee, minimum gas prices, tips) are carried as `Dec` so
/// that every node rounds the same way. Multiplication and division use
/// banker's rounding on the 19th digit, every operation is checked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Dec(i128);

fn precision_u256() -> U256 {
    U256::from(PRECISION_MULTIPLIER as u128)
}

// Remove the 18 precision digits of a widened product and round half to even
fn chop_precision_and_round(value: U256) -> U256 {
    let precision = precision_u256();
    let quo = value / precision;
    let rem = value % precision;
    let half = precision / 2;

    if rem < half {
        quo
    } else if rem > half {
        quo + 1
    } else if quo.bit(0) {
        quo + 1
    } else {
        quo
    }
}

fn u256_to_raw(value: U256, negative: bool) -> Result<i128, DecError> {
    if value > U256::from(i128::MAX as u128) {
        return Err(DecError::Overflow);
    }

    let raw = value.low_u128() as i128;
    Ok(if negative { -raw } else { raw })
}

impl Dec {
    pub const fn zero() -> Self {
        Dec(0)
    }

    pub const fn one() -> Self {
        Dec(PRECISION_MULTIPLIER)
    }

    pub const fn from_raw(raw: i128) -> Self {
        Dec(raw)
    }

    pub const fn raw(&self) -> i128 {
        self.0
    }

    pub const fn from_int(value: i64) -> Self {
        Dec(value as i128 * PRECISION_MULTIPLIER)
    }

    pub const fn from_u64(value: u64) -> Self {
        Dec(value as i128 * PRECISION_MULTIPLIER)
    }

    // Build `value * 10^-prec`, e.g. (5, 1) is 0.5
    pub fn new_with_prec(value: i64, prec: u32) -> Result<Self, DecError> {
        if prec > DEC_PRECISION {
            return Err(DecError::Overflow);
        }

        let scale = 10i128.pow(DEC_PRECISION - prec);
        (value as i128)
            .checked_mul(scale)
            .map(Dec)
            .ok_or(DecError::Overflow)
    }

    pub fn from_u256(value: U256) -> Result<Self, DecError> {
        let raw = value
            .checked_mul(precision_u256())
            .ok_or(DecError::Overflow)?;
        u256_to_raw(raw, false).map(Dec)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    fn abs_u256(&self) -> U256 {
        U256::from(self.0.unsigned_abs())
    }

    pub fn checked_add(&self, other: &Dec) -> Result<Dec, DecError> {
        self.0
            .checked_add(other.0)
            .map(Dec)
            .ok_or(DecError::Overflow)
    }

    pub fn checked_sub(&self, other: &Dec) -> Result<Dec, DecError> {
        self.0
            .checked_sub(other.0)
            .map(Dec)
            .ok_or(DecError::Overflow)
    }

    pub fn checked_mul(&self, other: &Dec) -> Result<Dec, DecError> {
        // Both operands fit in 127 bits so the widened product fits in a U256
        let product = self.abs_u256() * other.abs_u256();
        let chopped = chop_precision_and_round(product);
        u256_to_raw(chopped, self.is_negative() != other.is_negative()).map(Dec)
    }

    pub fn checked_mul_int(&self, value: U256) -> Result<Dec, DecError> {
        let product = self
            .abs_u256()
            .checked_mul(value)
            .ok_or(DecError::Overflow)?;
        u256_to_raw(product, self.is_negative()).map(Dec)
    }

    pub fn checked_quo(&self, other: &Dec) -> Result<Dec, DecError> {
        if other.is_zero() {
            return Err(DecError::DivisionByZero);
        }

        let precision = precision_u256();
        let numerator = self.abs_u256() * precision * precision;
        let quo = numerator / other.abs_u256();
        let chopped = chop_precision_and_round(quo);
        u256_to_raw(chopped, self.is_negative() != other.is_negative()).map(Dec)
    }

    pub fn checked_quo_int(&self, value: u64) -> Result<Dec, DecError> {
        if value == 0 {
            return Err(DecError::DivisionByZero);
        }

        Ok(Dec(self.0 / value as i128))
    }

    pub fn neg(&self) -> Dec {
        Dec(-self.0)
    }

    /// Integer part of a non negative decimal, rounded toward zero
    pub fn truncate_u256(&self) -> Result<U256, DecError> {
        if self.is_negative() {
            return Err(DecError::Negative);
        }

        Ok(self.abs_u256() / precision_u256())
    }

    /// Integer part of a non negative decimal, rounded up
    pub fn ceil_u256(&self) -> Result<U256, DecError> {
        if self.is_negative() {
            return Err(DecError::Negative);
        }

        let precision = precision_u256();
        let abs = self.abs_u256();
        let quo = abs / precision;
        if (abs % precision).is_zero() {
            Ok(quo)
        } else {
            Ok(quo + 1)
        }
    }

    pub fn truncate_i128(&self) -> i128 {
        self.0 / PRECISION_MULTIPLIER
    }

    pub fn max(self, other: Dec) -> Dec {
        if self >= other {
            self
        } else {
            other
        }
    }

    pub fn min(self, other: Dec) -> Dec {
        if self <= other {
            self
        } else {
            other
        }
    }
}

impl Display for Dec {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        let abs = self.0.unsigned_abs();
        let integer = abs / PRECISION_MULTIPLIER as u128;
        let fraction = abs % PRECISION_MULTIPLIER as u128;
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{}{}.{:018}", sign, integer, fraction)
    }
}

impl FromStr for Dec {
    type Err = DecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecError::Parse(s.to_string());
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (integer, fraction) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };

        if integer.is_empty()
            || fraction.len() > DEC_PRECISION as usize
            || !integer.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
            || (body.contains('.') && fraction.is_empty())
        {
            return Err(invalid());
        }

        let integer: i128 = integer.parse().map_err(|_| invalid())?;
        let mut padded = fraction.to_string();
        while padded.len() < DEC_PRECISION as usize {
            padded.push('0');
        }
        let fraction: i128 = padded.parse().map_err(|_| invalid())?;

        let raw = integer
            .checked_mul(PRECISION_MULTIPLIER)
            .and_then(|v| v.checked_add(fraction))
            .ok_or(DecError::Overflow)?;

        Ok(Dec(if negative { -raw } else { raw }))
    }
}

impl Serialize for Dec {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'a> Deserialize<'a> for Dec {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'a>,
    {
        let value = String::deserialize(deserializer)?;
        Dec::from_str(&value).map_err(SerdeError::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let dec = Dec::from_str("1.5").unwrap();
        assert_eq!(dec.to_string(), "1.500000000000000000");

        let dec = Dec::from_str("-0.000000000000000001").unwrap();
        assert_eq!(dec.raw(), -1);
        assert_eq!(dec.to_string(), "-0.000000000000000001");

        assert!(Dec::from_str("1.").is_err());
        assert!(Dec::from_str("abc").is_err());
        assert!(Dec::from_str("0.0000000000000000001").is_err());
    }

    #[test]
    fn test_mul_rounds_half_to_even() {
        // 0.000000000000000005 * 0.1 = 0.0000000000000000005 -> 0
        let a = Dec::from_raw(5);
        let b = Dec::new_with_prec(1, 1).unwrap();
        assert_eq!(a.checked_mul(&b).unwrap(), Dec::zero());

        // 0.000000000000000015 * 0.1 = 0.0000000000000000015 -> 0.000000000000000002
        let a = Dec::from_raw(15);
        assert_eq!(a.checked_mul(&b).unwrap(), Dec::from_raw(2));
    }

    #[test]
    fn test_quo() {
        let ten = Dec::from_int(10);
        let three = Dec::from_int(3);
        assert_eq!(
            ten.checked_quo(&three).unwrap().to_string(),
            "3.333333333333333333"
        );
        assert_eq!(ten.checked_quo(&Dec::zero()), Err(DecError::DivisionByZero));
    }

    #[test]
    fn test_truncate_and_ceil() {
        let dec = Dec::from_str("2.5").unwrap();
        assert_eq!(dec.truncate_u256().unwrap(), U256::from(2));
        assert_eq!(dec.ceil_u256().unwrap(), U256::from(3));
        assert_eq!(Dec::from_int(7).ceil_u256().unwrap(), U256::from(7));
        assert_eq!(Dec::from_int(-1).truncate_u256(), Err(DecError::Negative));
    }

    #[test]
    fn test_serde_as_string() {
        let dec = Dec::from_int(42);
        let json = serde_json::to_string(&dec).unwrap();
        assert_eq!(json, "\"42.000000000000000000\"");
        let back: Dec = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dec);
    }
}
