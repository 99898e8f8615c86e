//! # Plain Hex Addresses
//!
//! Parsing is deliberately permissive: an optional `0x`/`0X` prefix and 40
//! hex digits in any case. Mixed-case input is *not* checked against EIP-55,
//! matching how the ledger client itself accepts addresses. Rendering,
//! on the other hand, always emits the EIP-55 form so that what we print
//! can be pasted into a strict wallet.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::AddressError;
use crate::config::ADDRESS_LENGTH;

/// A raw 20-byte ledger address.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; ADDRESS_LENGTH]);

impl Address {
    /// The all-zero address. Valid, but almost never what anyone meant.
    pub const ZERO: Address = Address([0u8; ADDRESS_LENGTH]);

    pub const fn from_bytes(bytes: [u8; ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        let arr: [u8; ADDRESS_LENGTH] =
            bytes.try_into().map_err(|_| AddressError::InvalidLength {
                expected: ADDRESS_LENGTH,
                got: bytes.len(),
            })?;
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LENGTH] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    /// Whether `s` is `0x` + 40 hex digits (prefix optional).
    pub fn is_hex_address(s: &str) -> bool {
        let digits = strip_hex_prefix(s);
        digits.len() == 2 * ADDRESS_LENGTH && digits.bytes().all(|b| b.is_ascii_hexdigit())
    }

    /// Parses the plain hex form.
    pub fn parse_hex(s: &str) -> Result<Self, AddressError> {
        if !Self::is_hex_address(s) {
            return Err(AddressError::InvalidHex(s.to_string()));
        }
        let mut out = [0u8; ADDRESS_LENGTH];
        hex::decode_to_slice(strip_hex_prefix(s), &mut out)
            .map_err(|_| AddressError::InvalidHex(s.to_string()))?;
        Ok(Self(out))
    }

    /// Lowercase `0x…` form, as the JSON-RPC layer wants it.
    pub fn to_hex_lower(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// EIP-55 mixed-case form.
    pub fn to_checksum_string(&self) -> String {
        alloy_primitives::Address::new(self.0).to_checksum(None)
    }
}

fn strip_hex_prefix(s: &str) -> &str {
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_checksum_string())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex_lower())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_checksum_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::parse_hex(&s).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
