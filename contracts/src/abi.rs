//! # Contract ABI
//!
//! Call data and return values for the token standards we call, built on
//! `alloy-dyn-abi`. Arguments are `address`, `uint256`, `uint8` and
//! `string`; results are `uint8`, `uint256`, `bool`, `address`, `string`
//! and `uint256[]`.
//!
//! ```text
//! call data     := selector(4) || abi_encode_params(args)
//! creation data := bytecode    || abi_encode_params(constructor args)
//! selector      := keccak256("name(type,...)")[..4]
//! ```

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{keccak256, U256};
use thiserror::Error;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::RawAmount;

/// Size of one ABI word.
pub const WORD: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbiError {
    #[error("value does not fit in uint256")]
    ValueTooLarge,

    #[error("contract returned {got} bytes, expected at least {expected}")]
    ShortOutput { expected: usize, got: usize },

    #[error("value {0} does not fit the declared result type")]
    OutOfRange(String),

    #[error("abi decode failed: {0}")]
    Decode(String),

    #[error("contract returned no data; is there a contract at this address?")]
    EmptyOutput,
}

/// First four bytes of the Keccak-256 of a canonical signature.
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&hash[..4]);
    out
}

/// Builds call data for one function invocation, or creation data for a
/// contract deployment.
///
/// ```
/// use tokencommander_contracts::abi::CallBuilder;
///
/// let data = CallBuilder::new("totalSupply()").finish().unwrap();
/// assert_eq!(data, vec![0x18, 0x16, 0x0d, 0xdd]);
/// ```
pub struct CallBuilder {
    prefix: Vec<u8>,
    args: Vec<DynSolValue>,
    error: Option<AbiError>,
}

impl CallBuilder {
    pub fn new(signature: &str) -> Self {
        Self::with_prefix(selector(signature).to_vec())
    }

    /// Constructor arguments appended to contract creation bytecode.
    pub fn creation(bytecode: Vec<u8>) -> Self {
        Self::with_prefix(bytecode)
    }

    fn with_prefix(prefix: Vec<u8>) -> Self {
        Self {
            prefix,
            args: Vec::new(),
            error: None,
        }
    }

    pub fn address(mut self, address: &Address) -> Self {
        self.args
            .push(DynSolValue::Address(alloy_primitives::Address::new(*address.as_bytes())));
        self
    }

    pub fn uint(mut self, value: &RawAmount) -> Self {
        match to_u256(value) {
            Ok(word) => self.args.push(DynSolValue::Uint(word, 256)),
            Err(e) => self.error = self.error.or(Some(e)),
        }
        self
    }

    pub fn uint8(mut self, value: u8) -> Self {
        self.args.push(DynSolValue::Uint(U256::from(value), 8));
        self
    }

    pub fn string(mut self, value: &str) -> Self {
        self.args.push(DynSolValue::String(value.to_owned()));
        self
    }

    /// Encodes the call. Fails if any `uint` argument was out of range.
    pub fn finish(self) -> Result<Vec<u8>, AbiError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let mut data = self.prefix;
        data.extend_from_slice(&DynSolValue::Tuple(self.args).abi_encode_params());
        Ok(data)
    }
}

fn to_u256(value: &RawAmount) -> Result<U256, AbiError> {
    let bytes = value.to_be_bytes();
    if bytes.len() > WORD {
        return Err(AbiError::ValueTooLarge);
    }
    U256::try_from_be_slice(&bytes).ok_or(AbiError::ValueTooLarge)
}

fn from_u256(value: &U256) -> RawAmount {
    RawAmount::from_be_bytes(&value.to_be_bytes::<WORD>())
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

/// Decodes return data holding exactly one value of type `ty`.
fn decode_single(output: &[u8], ty: DynSolType) -> Result<DynSolValue, AbiError> {
    if output.is_empty() {
        return Err(AbiError::EmptyOutput);
    }
    if output.len() < WORD {
        return Err(AbiError::ShortOutput {
            expected: WORD,
            got: output.len(),
        });
    }
    let decoded = DynSolType::Tuple(vec![ty])
        .abi_decode_params(output)
        .map_err(|e| AbiError::Decode(e.to_string()))?;
    match decoded {
        DynSolValue::Tuple(mut values) if values.len() == 1 => Ok(values.remove(0)),
        other => Err(unexpected("a single value", &other)),
    }
}

fn unexpected(expected: &str, got: &DynSolValue) -> AbiError {
    AbiError::Decode(format!("expected {expected}, got {got:?}"))
}

pub fn decode_uint(output: &[u8]) -> Result<RawAmount, AbiError> {
    match decode_single(output, DynSolType::Uint(256))? {
        DynSolValue::Uint(value, _) => Ok(from_u256(&value)),
        other => Err(unexpected("uint256", &other)),
    }
}

pub fn decode_u8(output: &[u8]) -> Result<u8, AbiError> {
    match decode_single(output, DynSolType::Uint(256))? {
        DynSolValue::Uint(value, _) => {
            if value > U256::from(u8::MAX) {
                return Err(AbiError::OutOfRange(value.to_string()));
            }
            Ok(value.to_be_bytes::<WORD>()[WORD - 1])
        }
        other => Err(unexpected("uint8", &other)),
    }
}

pub fn decode_bool(output: &[u8]) -> Result<bool, AbiError> {
    match decode_single(output, DynSolType::Bool)? {
        DynSolValue::Bool(value) => Ok(value),
        other => Err(unexpected("bool", &other)),
    }
}

pub fn decode_address(output: &[u8]) -> Result<Address, AbiError> {
    match decode_single(output, DynSolType::Address)? {
        DynSolValue::Address(value) => {
            Address::from_slice(value.as_slice()).map_err(|e| AbiError::OutOfRange(e.to_string()))
        }
        other => Err(unexpected("address", &other)),
    }
}

pub fn decode_string(output: &[u8]) -> Result<String, AbiError> {
    match decode_single(output, DynSolType::String)? {
        DynSolValue::String(value) => Ok(value),
        other => Err(unexpected("string", &other)),
    }
}

pub fn decode_uint_array(output: &[u8]) -> Result<Vec<RawAmount>, AbiError> {
    match decode_single(output, DynSolType::Array(Box::new(DynSolType::Uint(256))))? {
        DynSolValue::Array(values) => values
            .iter()
            .map(|value| match value {
                DynSolValue::Uint(word, _) => Ok(from_u256(word)),
                other => Err(unexpected("uint256", other)),
            })
            .collect(),
        other => Err(unexpected("uint256[]", &other)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
