//! # Ledger Module
//!
//! The protocol crate never talks to a node itself. Everything that needs
//! one (balance checks, nonces, submission, receipts) goes through the
//! [`Ledger`] trait, which the contracts crate implements over JSON-RPC and
//! tests implement in memory.
//!
//! ```text
//! mod.rs      TxId, SubmittedTransfer, Confirmation, Ledger, LedgerError
//! unlock.rs   bounded passphrase retry for node-managed accounts
//! ```

pub mod unlock;

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

use crate::address::{Address, ChainId};
use crate::amount::RawAmount;
use crate::config::{ALWAYS_FAILING_SIGNATURES, TX_ALWAYS_FAILS_MESSAGE};

pub use unlock::{unlock_with_retries, AccountUnlocker, PassphrasePrompt, PromptError, UnlockOutcome};

// ---------------------------------------------------------------------------
// Transaction Identifiers
// ---------------------------------------------------------------------------

/// A 32-byte transaction hash.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TxId([u8; 32]);

impl TxId {
    pub const fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Parses `0x` + 64 hex digits.
    pub fn parse_hex(s: &str) -> Result<Self, LedgerError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut out = [0u8; 32];
        hex::decode_to_slice(digits, &mut out)
            .map_err(|e| LedgerError::InvalidResponse(format!("bad transaction hash '{s}': {e}")))?;
        Ok(Self(out))
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TxId({})", self.to_hex())
    }
}

// ---------------------------------------------------------------------------
// Requests & Results
// ---------------------------------------------------------------------------

/// One token transfer with every sequencing decision already made.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferRequest {
    pub from: Address,
    pub to: Address,
    pub amount: RawAmount,
    pub nonce: u64,
    pub gas_price: RawAmount,
}

/// What the ledger hands back once a transfer is broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubmittedTransfer {
    pub tx_id: TxId,
    /// Gas limit attached to the transaction (estimated or default).
    pub gas_limit: u64,
}

/// A mined transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Confirmation {
    pub gas_used: u64,
    /// `false` when the transaction was mined but reverted.
    pub success: bool,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a [`Ledger`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// Gas estimation proved the transaction can never succeed.
    #[error("{}", TX_ALWAYS_FAILS_MESSAGE)]
    WouldAlwaysFail,

    /// The node refused the transaction.
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// The node could not be reached, or answered with a protocol error.
    #[error("ledger transport error: {0}")]
    Transport(String),

    /// The node answered with something we could not interpret.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    /// No receipt appeared before the transport gave up waiting.
    #[error("timed out waiting for transaction {0}")]
    ConfirmationTimeout(TxId),

    /// The account could not be unlocked for signing.
    #[error("account {account} is locked: {reason}")]
    Locked { account: Address, reason: String },
}

impl LedgerError {
    /// Classifies a node-side submission error.
    ///
    /// Messages carrying a known always-failing signature become
    /// [`LedgerError::WouldAlwaysFail`]; everything else is kept verbatim.
    pub fn from_submission_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_always_failing(&message) {
            LedgerError::WouldAlwaysFail
        } else {
            LedgerError::Rejected(message)
        }
    }
}

/// Whether a node error message says the transaction can never succeed.
pub fn is_always_failing(message: &str) -> bool {
    ALWAYS_FAILING_SIGNATURES.iter().any(|sig| message.contains(sig))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Token ledger as seen by the batch executor.
///
/// Amounts are raw units of the configured token, except gas prices which
/// are in the chain's minor native unit.
#[async_trait]
pub trait Ledger: Send + Sync {
    async fn balance_of(&self, owner: &Address) -> Result<RawAmount, LedgerError>;

    /// Next nonce for `account`, counting transactions still in the pool.
    async fn pending_nonce(&self, account: &Address) -> Result<u64, LedgerError>;

    async fn network_chain_id(&self) -> Result<ChainId, LedgerError>;

    async fn suggest_gas_price(&self) -> Result<RawAmount, LedgerError>;

    async fn transfer(&self, request: TransferRequest) -> Result<SubmittedTransfer, LedgerError>;

    /// Blocks until `tx_id` is mined, bounded by the implementation.
    async fn wait_confirmed(&self, tx_id: &TxId) -> Result<Confirmation, LedgerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn always_failing_signatures_are_remapped() {
        for message in [
            "gas required exceeds allowance (8000000) or always failing transaction",
            "execution reverted: always failing transaction",
        ] {
            let err = LedgerError::from_submission_message(message);
            assert_eq!(err, LedgerError::WouldAlwaysFail);
            assert_eq!(err.to_string(), TX_ALWAYS_FAILS_MESSAGE);
        }
    }

    #[test]
    fn other_submission_errors_are_kept() {
        assert_eq!(
            LedgerError::from_submission_message("nonce too low"),
            LedgerError::Rejected("nonce too low".into())
        );
    }

    #[test]
    fn tx_id_hex_roundtrip() {
        let text = format!("0x{}", "ab".repeat(32));
        let id = TxId::parse_hex(&text).unwrap();
        assert_eq!(id.to_string(), text);
        assert_eq!(id.as_bytes(), &[0xab; 32]);
    }

    #[test]
    fn tx_id_rejects_short_hash() {
        assert!(matches!(
            TxId::parse_hex("0x1234"),
            Err(LedgerError::InvalidResponse(_))
        ));
    }
}
