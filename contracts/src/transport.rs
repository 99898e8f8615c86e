//! # Contract Transport
//!
//! The node-facing surface the token bindings need. The command line
//! implements it over JSON-RPC; tests implement it in memory.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use tokencommander_protocol::address::{Address, ChainId};
use tokencommander_protocol::amount::RawAmount;
use tokencommander_protocol::ledger::{LedgerError, TxId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Connection refused, TLS failure, HTTP status, ...
    #[error("http error: {0}")]
    Http(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("invalid rpc response: {0}")]
    InvalidResponse(String),

    #[error("transaction {tx_id} not mined within {waited:?}")]
    Timeout { tx_id: TxId, waited: Duration },
}

impl From<TransportError> for LedgerError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Rpc { message, .. } => LedgerError::from_submission_message(message),
            TransportError::Http(message) => LedgerError::Transport(message),
            TransportError::InvalidResponse(message) => LedgerError::InvalidResponse(message),
            TransportError::Timeout { tx_id, .. } => LedgerError::ConfirmationTimeout(tx_id),
        }
    }
}

/// Sender-side knobs for a state-changing call. Unset fields are filled in
/// from the node before sending.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactOpts {
    pub from: Address,
    pub nonce: Option<u64>,
    pub gas_price: Option<RawAmount>,
    pub gas_limit: Option<u64>,
}

impl TransactOpts {
    pub fn new(from: Address) -> Self {
        Self {
            from,
            nonce: None,
            gas_price: None,
            gas_limit: None,
        }
    }
}

/// A fully specified transaction as handed to the node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransactionRequest {
    pub from: Address,
    /// `None` creates a contract from `data`.
    pub to: Option<Address>,
    pub data: Vec<u8>,
    /// `None` lets the node pick the account's next nonce.
    pub nonce: Option<u64>,
    pub gas_price: RawAmount,
    pub gas_limit: u64,
}

/// A broadcast transaction and the gas terms it was sent with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SentTransaction {
    pub tx_id: TxId,
    pub gas_price: RawAmount,
    pub gas_limit: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Receipt {
    pub tx_id: TxId,
    pub gas_used: u64,
    /// Receipt status 1.
    pub success: bool,
    /// Set when the transaction created a contract.
    pub contract_address: Option<Address>,
}

#[async_trait]
pub trait ContractTransport: Send + Sync {
    /// Read-only call against pending state.
    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, TransportError>;

    /// `to` is `None` when estimating a contract creation.
    async fn estimate_gas(&self, from: &Address, to: Option<&Address>, data: &[u8]) -> Result<u64, TransportError>;

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxId, TransportError>;

    async fn pending_nonce(&self, account: &Address) -> Result<u64, TransportError>;

    async fn network_id(&self) -> Result<ChainId, TransportError>;

    async fn gas_price(&self) -> Result<RawAmount, TransportError>;

    /// Polls until `tx_id` has a receipt or the transport's own bound runs out.
    async fn wait_for_receipt(&self, tx_id: &TxId) -> Result<Receipt, TransportError>;

    /// Returns `false` when the node rejects the passphrase.
    async fn unlock_account(
        &self,
        account: &Address,
        passphrase: &str,
        duration: Duration,
    ) -> Result<bool, TransportError>;
}
