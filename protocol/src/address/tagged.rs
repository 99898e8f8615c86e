//! # Chain-Tagged Addresses
//!
//! ```text
//! "NEW" || base58check( version || chain_id || address )
//!
//! version   1 byte, always 0
//! chain_id  the chain identifier bytes, compared byte for byte on decode
//! address   20 bytes
//! checksum  first 4 bytes of sha256(sha256(version || chain_id || address))
//! ```

use num_bigint::BigUint;
use std::fmt;

use super::{Address, AddressError};
use crate::config::{ADDRESS_LENGTH, TAGGED_ADDRESS_TAG, TAGGED_ADDRESS_VERSION};

/// Chain identifier as embedded in a tagged address.
///
/// Ids derived from a numeric network id are minimal big-endian bytes
/// (zero is the empty sequence). Ids recovered from a tagged address keep
/// exactly the bytes that were embedded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ChainId(Vec<u8>);

impl ChainId {
    /// Wraps `bytes` unchanged.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(bytes.to_vec())
    }

    /// Minimal big-endian form of a numeric network id.
    pub fn from_biguint(value: &BigUint) -> Self {
        if value == &BigUint::default() {
            Self(Vec::new())
        } else {
            Self(value.to_bytes_be())
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }
}

impl From<u64> for ChainId {
    fn from(value: u64) -> Self {
        Self::from_biguint(&BigUint::from(value))
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_biguint())
    }
}

/// Encodes `address` for `chain_id`.
pub fn encode_tagged(chain_id: &ChainId, address: &Address) -> String {
    let mut payload = Vec::with_capacity(chain_id.as_bytes().len() + ADDRESS_LENGTH);
    payload.extend_from_slice(chain_id.as_bytes());
    payload.extend_from_slice(address.as_bytes());
    let body = bs58::encode(payload)
        .with_check_version(TAGGED_ADDRESS_VERSION)
        .into_string();
    format!("{TAGGED_ADDRESS_TAG}{body}")
}

/// Decodes a tagged address and checks that it belongs to `expected`.
///
/// Checks run in order: tag, base58, checksum, version, payload length,
/// chain. The first failure wins.
pub fn decode_tagged(text: &str, expected: &ChainId) -> Result<(ChainId, Address), AddressError> {
    let body = text
        .strip_prefix(TAGGED_ADDRESS_TAG)
        .ok_or(AddressError::MissingTag { tag: TAGGED_ADDRESS_TAG })?;

    // The checksum is verified here; the version byte is checked below so
    // that a bad version is reported as such.
    let raw = bs58::decode(body).with_check(None).into_vec().map_err(|e| match e {
        bs58::decode::Error::InvalidChecksum { .. } => AddressError::ChecksumMismatch,
        other => AddressError::InvalidEncoding(other.to_string()),
    })?;

    let (version, payload) = raw
        .split_first()
        .ok_or_else(|| AddressError::InvalidEncoding("no version byte".to_string()))?;
    if *version != TAGGED_ADDRESS_VERSION {
        return Err(AddressError::BadVersion(*version));
    }
    if payload.len() < ADDRESS_LENGTH {
        return Err(AddressError::PayloadTooShort(payload.len()));
    }

    let (chain_bytes, address_bytes) = payload.split_at(payload.len() - ADDRESS_LENGTH);
    if chain_bytes != expected.as_bytes() {
        return Err(AddressError::ChainMismatch {
            expected: expected.clone(),
            got: ChainId::from_bytes(chain_bytes),
        });
    }
    Ok((ChainId::from_bytes(chain_bytes), Address::from_slice(address_bytes)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
