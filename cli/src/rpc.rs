//! # JSON-RPC Transport
//!
//! [`HttpTransport`] implements the contracts crate's `ContractTransport`
//! over HTTP JSON-RPC 2.0. Quantities travel as `0x`-prefixed hex without
//! leading zeros, byte strings as `0x`-prefixed hex.
//!
//! Transactions are signed by the node (`eth_sendTransaction`), so the
//! `from` account has to be unlocked there first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, trace};

use tokencommander_contracts::{ContractTransport, Receipt, TransactionRequest, TransportError};
use tokencommander_protocol::address::{Address, ChainId};
use tokencommander_protocol::amount::RawAmount;
use tokencommander_protocol::config::{CONFIRMATION_TIMEOUT, RECEIPT_POLL_INTERVAL};
use tokencommander_protocol::ledger::TxId;

/// Per-request HTTP timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire Types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
struct JsonRpcRequest<'a> {
    jsonrpc: &'static str,
    method: &'a str,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Clone, Deserialize)]
struct JsonRpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    fn into_result(self) -> Result<Value, TransportError> {
        match self.error {
            Some(err) => Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    gas_used: String,
    /// Absent on pre-Byzantium chains.
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

pub struct HttpTransport {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
    poll_interval: Duration,
    confirmation_timeout: Duration,
    /// `net_version` never changes for a given endpoint.
    chain_id: Mutex<Option<ChainId>>,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
            poll_interval: RECEIPT_POLL_INTERVAL,
            confirmation_timeout: CONFIRMATION_TIMEOUT,
            chain_id: Mutex::new(None),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn request(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let req = JsonRpcRequest {
            jsonrpc: "2.0",
            method,
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };
        trace!(method, id = req.id, "rpc request");

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?
            .into_result()
    }

    /// Native coin balance of `account` at the latest block.
    pub async fn balance(&self, account: &Address) -> Result<RawAmount, TransportError> {
        let params = vec![json!(account.to_hex_lower()), json!("latest")];
        parse_quantity_amount(&self.request_string("eth_getBalance", params).await?)
    }

    /// Accounts managed by the node.
    pub async fn accounts(&self) -> Result<Vec<Address>, TransportError> {
        match self.request("eth_accounts", Vec::new()).await? {
            Value::Array(items) => items.iter().map(parse_address_value).collect(),
            other => Err(TransportError::InvalidResponse(format!(
                "eth_accounts: expected an array, got {other}"
            ))),
        }
    }

    async fn request_string(&self, method: &str, params: Vec<Value>) -> Result<String, TransportError> {
        match self.request(method, params).await? {
            Value::String(s) => Ok(s),
            other => Err(TransportError::InvalidResponse(format!(
                "{method}: expected a string, got {other}"
            ))),
        }
    }
}

#[async_trait]
impl ContractTransport for HttpTransport {
    async fn call(&self, to: &Address, data: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let params = vec![
            json!({ "to": to.to_hex_lower(), "data": encode_bytes(&data) }),
            json!("pending"),
        ];
        decode_bytes(&self.request_string("eth_call", params).await?)
    }

    async fn estimate_gas(&self, from: &Address, to: Option<&Address>, data: &[u8]) -> Result<u64, TransportError> {
        let mut call = json!({
            "from": from.to_hex_lower(),
            "data": encode_bytes(data),
        });
        if let Some(to) = to {
            call["to"] = json!(to.to_hex_lower());
        }
        parse_quantity_u64(&self.request_string("eth_estimateGas", vec![call]).await?)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxId, TransportError> {
        let mut tx = json!({
            "from": request.from.to_hex_lower(),
            "data": encode_bytes(&request.data),
            "gas": encode_quantity(request.gas_limit),
            "gasPrice": encode_amount(&request.gas_price),
        });
        if let Some(to) = request.to {
            tx["to"] = json!(to.to_hex_lower());
        }
        if let Some(nonce) = request.nonce {
            tx["nonce"] = json!(encode_quantity(nonce));
        }
        let hash = self.request_string("eth_sendTransaction", vec![tx]).await?;
        TxId::parse_hex(&hash).map_err(|e| TransportError::InvalidResponse(e.to_string()))
    }

    async fn pending_nonce(&self, account: &Address) -> Result<u64, TransportError> {
        let params = vec![json!(account.to_hex_lower()), json!("pending")];
        parse_quantity_u64(&self.request_string("eth_getTransactionCount", params).await?)
    }

    async fn network_id(&self) -> Result<ChainId, TransportError> {
        let cached = self.chain_id.lock().clone();
        if let Some(chain_id) = cached {
            return Ok(chain_id);
        }
        let version = self.request_string("net_version", Vec::new()).await?;
        let chain_id = parse_network_version(&version)?;
        debug!(%chain_id, "network id");
        *self.chain_id.lock() = Some(chain_id.clone());
        Ok(chain_id)
    }

    async fn gas_price(&self) -> Result<RawAmount, TransportError> {
        parse_quantity_amount(&self.request_string("eth_gasPrice", Vec::new()).await?)
    }

    async fn wait_for_receipt(&self, tx_id: &TxId) -> Result<Receipt, TransportError> {
        let deadline = tokio::time::Instant::now() + self.confirmation_timeout;
        loop {
            let value = self
                .request("eth_getTransactionReceipt", vec![json!(tx_id.to_hex())])
                .await?;
            if !value.is_null() {
                return parse_receipt(*tx_id, value);
            }
            if tokio::time::Instant::now() >= deadline {
                return Err(TransportError::Timeout {
                    tx_id: *tx_id,
                    waited: self.confirmation_timeout,
                });
            }
            trace!(%tx_id, "receipt not available yet");
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    async fn unlock_account(
        &self,
        account: &Address,
        passphrase: &str,
        duration: Duration,
    ) -> Result<bool, TransportError> {
        let params = vec![
            json!(account.to_hex_lower()),
            json!(passphrase),
            json!(duration.as_secs()),
        ];
        match self.request("personal_unlockAccount", params).await? {
            Value::Bool(unlocked) => Ok(unlocked),
            other => Err(TransportError::InvalidResponse(format!(
                "personal_unlockAccount: expected a bool, got {other}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoding Helpers
// ---------------------------------------------------------------------------

fn encode_bytes(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

fn decode_bytes(text: &str) -> Result<Vec<u8>, TransportError> {
    let digits = text.strip_prefix("0x").unwrap_or(text);
    hex::decode(digits).map_err(|e| TransportError::InvalidResponse(format!("bad hex data '{text}': {e}")))
}

fn encode_quantity(value: u64) -> String {
    format!("0x{value:x}")
}

fn encode_amount(value: &RawAmount) -> String {
    let digits = hex::encode(value.to_be_bytes());
    match digits.trim_start_matches('0') {
        "" => "0x0".to_string(),
        trimmed => format!("0x{trimmed}"),
    }
}

fn quantity_digits(text: &str) -> Result<&str, TransportError> {
    let digits = text
        .strip_prefix("0x")
        .ok_or_else(|| TransportError::InvalidResponse(format!("quantity '{text}' lacks 0x prefix")))?;
    if digits.is_empty() {
        return Err(TransportError::InvalidResponse(format!("empty quantity '{text}'")));
    }
    Ok(digits)
}

fn parse_quantity_u64(text: &str) -> Result<u64, TransportError> {
    let digits = quantity_digits(text)?;
    u64::from_str_radix(digits, 16)
        .map_err(|e| TransportError::InvalidResponse(format!("bad quantity '{text}': {e}")))
}

fn parse_quantity_amount(text: &str) -> Result<RawAmount, TransportError> {
    let digits = quantity_digits(text)?;
    let padded = if digits.len() % 2 == 1 {
        format!("0{digits}")
    } else {
        digits.to_string()
    };
    let bytes = hex::decode(&padded)
        .map_err(|e| TransportError::InvalidResponse(format!("bad quantity '{text}': {e}")))?;
    Ok(RawAmount::from_be_bytes(&bytes))
}

/// `net_version` answers with a decimal string.
fn parse_network_version(text: &str) -> Result<ChainId, TransportError> {
    let raw: RawAmount = text
        .trim()
        .parse()
        .map_err(|_| TransportError::InvalidResponse(format!("bad network version '{text}'")))?;
    Ok(ChainId::from_biguint(raw.as_biguint()))
}

fn parse_receipt(tx_id: TxId, value: Value) -> Result<Receipt, TransportError> {
    let receipt: RpcReceipt =
        serde_json::from_value(value).map_err(|e| TransportError::InvalidResponse(e.to_string()))?;
    let gas_used = parse_quantity_u64(&receipt.gas_used)?;
    let success = match receipt.status.as_deref() {
        None => true,
        Some(status) => parse_quantity_u64(status)? == 1,
    };
    let contract_address = receipt
        .contract_address
        .as_deref()
        .map(parse_address)
        .transpose()?;
    Ok(Receipt {
        tx_id,
        gas_used,
        success,
        contract_address,
    })
}

fn parse_address(text: &str) -> Result<Address, TransportError> {
    Address::parse_hex(text).map_err(|e| TransportError::InvalidResponse(e.to_string()))
}

fn parse_address_value(value: &Value) -> Result<Address, TransportError> {
    match value {
        Value::String(text) => parse_address(text),
        other => Err(TransportError::InvalidResponse(format!(
            "expected an address, got {other}"
        ))),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
