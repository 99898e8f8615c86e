//! # Address Module
//!
//! A ledger address is 20 bytes. People write it down in one of two ways:
//!
//! 1. **Plain hex**: `0x` + 40 hex digits, the ledger's native form.
//!    Rendered with the EIP-55 mixed-case checksum for display.
//! 2. **Tagged**: `NEW` + base58-check(`chain_id || address`). The chain
//!    identifier sits inside the checksummed payload, so an address copied
//!    from one chain is rejected outright on another.
//!
//! ```text
//! plain.rs    Address, hex parsing, EIP-55 rendering
//! tagged.rs   ChainId, tagged encode/decode
//! ```

pub mod plain;
pub mod tagged;

use thiserror::Error;

pub use self::plain::Address;
pub use self::tagged::{decode_tagged, encode_tagged, ChainId};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors produced while parsing or decoding addresses.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    /// Not `0x` + 40 hex digits.
    #[error("invalid hex address '{0}'")]
    InvalidHex(String),

    /// A raw byte slice had the wrong length.
    #[error("invalid address length: expected {expected} bytes, got {got}")]
    InvalidLength { expected: usize, got: usize },

    /// The tagged form must start with the literal tag.
    #[error("not a tagged address: missing '{tag}' prefix")]
    MissingTag { tag: &'static str },

    /// The body is not valid base58, or too short to carry a checksum.
    #[error("invalid base58 encoding: {0}")]
    InvalidEncoding(String),

    /// The base58-check checksum does not verify.
    #[error("address checksum mismatch")]
    ChecksumMismatch,

    /// The version byte is not the expected one.
    #[error("illegal address version {0}")]
    BadVersion(u8),

    /// The decoded payload cannot hold a 20-byte address.
    #[error("decoded payload too short: {0} bytes")]
    PayloadTooShort(usize),

    /// The embedded chain identifier belongs to another chain.
    #[error("address belongs to chain {got}, expected chain {expected}")]
    ChainMismatch { expected: ChainId, got: ChainId },
}

/// Parses a destination written either as plain hex or, when `tagged_chain`
/// is given, as a tagged address for that chain.
///
/// Hex is always tried first. When both fail, the tagged error is returned
/// because it is the more specific of the two.
pub fn parse_destination(text: &str, tagged_chain: Option<&ChainId>) -> Result<Address, AddressError> {
    match Address::parse_hex(text) {
        Ok(address) => Ok(address),
        Err(hex_err) => match tagged_chain {
            Some(chain_id) => decode_tagged(text, chain_id).map(|(_, address)| address),
            None => Err(hex_err),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destination_prefers_hex() {
        let text = "0x00000000000000000000000000000000000000aa";
        let chain = ChainId::from(1u64);
        let expected = Address::parse_hex(text).unwrap();
        assert_eq!(parse_destination(text, Some(&chain)).unwrap(), expected);
        assert_eq!(parse_destination(text, None).unwrap(), expected);
    }

    #[test]
    fn destination_falls_back_to_tagged() {
        let chain = ChainId::from(1012u64);
        let address = Address::from_bytes([0x42; 20]);
        let tagged = encode_tagged(&chain, &address);
        assert_eq!(parse_destination(&tagged, Some(&chain)).unwrap(), address);
    }

    #[test]
    fn tagged_destination_refused_without_chain() {
        let chain = ChainId::from(1012u64);
        let tagged = encode_tagged(&chain, &Address::from_bytes([0x42; 20]));
        assert!(matches!(
            parse_destination(&tagged, None),
            Err(AddressError::InvalidHex(_))
        ));
    }
}
