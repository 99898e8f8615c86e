//! # Decimal Codec
//!
//! Conversion between human decimal strings and raw ledger units.
//!
//! Accepted input grammar:
//!
//! ```text
//! amount   := integer [ "." fraction ] | "." fraction
//! integer  := "0" | [1-9][0-9]*
//! fraction := [0-9]*          (at most `decimals` digits)
//! ```
//!
//! `"1."` is accepted as `"1"` and `".5"` as `"0.5"`. No signs, no
//! whitespace, no exponents, no thousands separators.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use thiserror::Error;

use crate::config::MAX_DECIMALS;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced by the amount codec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// The text is not a valid decimal amount for the token's precision.
    #[error("invalid amount format '{text}': {reason}")]
    InvalidAmountFormat {
        /// The rejected input, verbatim.
        text: String,
        /// What was wrong with it.
        reason: &'static str,
    },

    /// A token declared more decimal places than the codec supports.
    #[error("decimals {0} out of range, at most {MAX_DECIMALS} supported")]
    DecimalsOutOfRange(u32),
}

impl AmountError {
    fn invalid(text: &str, reason: &'static str) -> Self {
        AmountError::InvalidAmountFormat {
            text: text.to_string(),
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Decimals
// ---------------------------------------------------------------------------

/// Number of fractional digits a token uses, in `[0, 18]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Decimals(u8);

impl Decimals {
    /// Integer-only tokens (and ERC-721 token ids).
    pub const ZERO: Decimals = Decimals(0);

    /// The widest supported scale, also the native unit scale.
    pub const MAX: Decimals = Decimals(MAX_DECIMALS);

    pub fn new(decimals: u32) -> Result<Self, AmountError> {
        if decimals > u32::from(MAX_DECIMALS) {
            return Err(AmountError::DecimalsOutOfRange(decimals));
        }
        Ok(Self(decimals as u8))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    fn width(self) -> usize {
        usize::from(self.0)
    }
}

impl TryFrom<u8> for Decimals {
    type Error = AmountError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(u32::from(value))
    }
}

impl fmt::Display for Decimals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// RawAmount
// ---------------------------------------------------------------------------

/// A non-negative quantity in a token's smallest unit.
///
/// Immutable once built. Arithmetic produces new values; it never wraps
/// and never fails.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawAmount(BigUint);

impl RawAmount {
    pub fn zero() -> Self {
        Self(BigUint::zero())
    }

    pub fn from_biguint(value: BigUint) -> Self {
        Self(value)
    }

    /// Interprets `bytes` as a big-endian unsigned integer.
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        Self(BigUint::from_bytes_be(bytes))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    pub fn into_biguint(self) -> BigUint {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Minimal big-endian bytes. Zero is a single `0x00` byte.
    pub fn to_be_bytes(&self) -> Vec<u8> {
        self.0.to_bytes_be()
    }

    /// Base-10 digits, no separators. Always at least one digit.
    pub fn to_decimal_digits(&self) -> String {
        self.0.to_str_radix(10)
    }

    /// Number of base-10 digits in the value (`0` has one digit).
    pub fn digit_count(&self) -> usize {
        self.to_decimal_digits().len()
    }

    /// Multiplies by a machine integer, e.g. gas price × gas used.
    pub fn mul_u64(&self, rhs: u64) -> RawAmount {
        RawAmount(&self.0 * BigUint::from(rhs))
    }
}

impl From<u64> for RawAmount {
    fn from(value: u64) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<u128> for RawAmount {
    fn from(value: u128) -> Self {
        Self(BigUint::from(value))
    }
}

impl From<BigUint> for RawAmount {
    fn from(value: BigUint) -> Self {
        Self(value)
    }
}

impl Add for RawAmount {
    type Output = RawAmount;

    fn add(self, rhs: RawAmount) -> RawAmount {
        RawAmount(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a RawAmount> for &'a RawAmount {
    type Output = RawAmount;

    fn add(self, rhs: &'a RawAmount) -> RawAmount {
        RawAmount(&self.0 + &rhs.0)
    }
}

impl AddAssign<&RawAmount> for RawAmount {
    fn add_assign(&mut self, rhs: &RawAmount) {
        self.0 += &rhs.0;
    }
}

impl<'a> Sum<&'a RawAmount> for RawAmount {
    fn sum<I: Iterator<Item = &'a RawAmount>>(iter: I) -> Self {
        iter.fold(RawAmount::zero(), |mut acc, x| {
            acc += x;
            acc
        })
    }
}

impl Sum for RawAmount {
    fn sum<I: Iterator<Item = RawAmount>>(iter: I) -> Self {
        iter.fold(RawAmount::zero(), |acc, x| acc + x)
    }
}

impl fmt::Display for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RawAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawAmount({})", self.0)
    }
}

/// Parses a plain base-10 integer in raw units (no decimal point).
impl FromStr for RawAmount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decimal_string_to_raw(s, Decimals::ZERO)
    }
}

impl Serialize for RawAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal_digits())
    }
}

impl<'de> Deserialize<'de> for RawAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

/// Converts human decimal text into raw units under `decimals`.
///
/// The fraction is right-padded with zeros to exactly `decimals` digits and
/// glued to the integer digits. Too many fractional digits is an error.
///
/// ```
/// use tokencommander_protocol::amount::{decimal_string_to_raw, Decimals, RawAmount};
///
/// let six = Decimals::new(6).unwrap();
/// assert_eq!(decimal_string_to_raw("100", six).unwrap(), RawAmount::from(100_000_000u64));
/// assert_eq!(decimal_string_to_raw("0.25", six).unwrap(), RawAmount::from(250_000u64));
/// assert!(decimal_string_to_raw("1.2345", Decimals::new(2).unwrap()).is_err());
/// ```
pub fn decimal_string_to_raw(text: &str, decimals: Decimals) -> Result<RawAmount, AmountError> {
    let (integer, fraction) = match text.split_once('.') {
        Some((integer, fraction)) => (integer, fraction),
        None => (text, ""),
    };

    if fraction.contains('.') {
        return Err(AmountError::invalid(text, "more than one decimal point"));
    }
    if !integer.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::invalid(text, "integer part must be decimal digits"));
    }
    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AmountError::invalid(text, "fractional part must be decimal digits"));
    }
    if integer.is_empty() && fraction.is_empty() {
        return Err(AmountError::invalid(text, "no digits"));
    }
    if integer.len() > 1 && integer.starts_with('0') {
        return Err(AmountError::invalid(text, "leading zero in integer part"));
    }
    if fraction.len() > decimals.width() {
        return Err(AmountError::invalid(
            text,
            "more fractional digits than the token's decimals",
        ));
    }

    let mut digits = String::with_capacity(integer.len() + decimals.width());
    digits.push_str(integer);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals.width() - fraction.len()));

    BigUint::parse_bytes(digits.as_bytes(), 10)
        .map(RawAmount)
        .ok_or_else(|| AmountError::invalid(text, "not a base-10 integer"))
}

/// Renders raw units as decimal text under `decimals`, trimming trailing
/// fractional zeros and dropping the point when nothing remains after it.
///
/// ```
/// use tokencommander_protocol::amount::{raw_to_decimal_string, Decimals, RawAmount};
///
/// let six = Decimals::new(6).unwrap();
/// assert_eq!(raw_to_decimal_string(&RawAmount::from(100_000_000u64), six), "100");
/// assert_eq!(raw_to_decimal_string(&RawAmount::from(5u64), six), "0.000005");
/// ```
pub fn raw_to_decimal_string(raw: &RawAmount, decimals: Decimals) -> String {
    let digits = raw.to_decimal_digits();
    let width = decimals.width();
    if width == 0 {
        return digits;
    }

    let (integer, fraction) = if digits.len() <= width {
        ("0".to_string(), format!("{digits:0>width$}"))
    } else {
        let split = digits.len() - width;
        (digits[..split].to_string(), digits[split..].to_string())
    };

    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
