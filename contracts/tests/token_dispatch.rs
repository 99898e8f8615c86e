//! Integration tests for the token bindings.
//!
//! A scripted transport answers read calls by selector and records every
//! transaction it is asked to send, so the tests can check both what the
//! bindings decode and what they put on the wire.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use tokencommander_contracts::abi::selector;
use tokencommander_contracts::{
    deploy, ContractError, ContractTransport, Erc20, Erc20Ledger, NodeAccounts, Receipt, Token, TokenParams,
    TransactOpts, TransactionRequest, TransportError,
};
use tokencommander_protocol::address::{Address, ChainId};
use tokencommander_protocol::amount::{Decimals, RawAmount};
use tokencommander_protocol::batch::{BatchExecutor, BatchPlanner, ExecutorConfig, PlannerConfig};
use tokencommander_protocol::config::Blockchain;
use tokencommander_protocol::ledger::{unlock_with_retries, PassphrasePrompt, PromptError, TxId, UnlockOutcome};
use tokencommander_protocol::token::TokenKind;

// ---------------------------------------------------------------------------
// Scripted Transport
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ScriptedTransport {
    replies: HashMap<[u8; 4], Vec<u8>>,
    estimate_error: Option<String>,
    passphrase: &'static str,
    calls: Mutex<Vec<Vec<u8>>>,
    sent: Mutex<Vec<TransactionRequest>>,
}

impl ScriptedTransport {
    fn reply(mut self, signature: &str, output: Vec<u8>) -> Self {
        self.replies.insert(selector(signature), output);
        self
    }

    fn sent(&self) -> Vec<TransactionRequest> {
        self.sent.lock().clone()
    }
}

fn tx_id_for(index: usize) -> TxId {
    let mut bytes = [0u8; 32];
    bytes[31] = index as u8 + 1;
    TxId::from_bytes(bytes)
}

#[async_trait]
impl ContractTransport for ScriptedTransport {
    async fn call(&self, _to: &Address, data: Vec<u8>) -> Result<Vec<u8>, TransportError> {
        let key = [data[0], data[1], data[2], data[3]];
        self.calls.lock().push(data);
        Ok(self.replies.get(&key).cloned().unwrap_or_default())
    }

    async fn estimate_gas(&self, _from: &Address, _to: Option<&Address>, _data: &[u8]) -> Result<u64, TransportError> {
        match &self.estimate_error {
            Some(message) => Err(TransportError::Rpc {
                code: -32000,
                message: message.clone(),
            }),
            None => Ok(60_000),
        }
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<TxId, TransportError> {
        let mut sent = self.sent.lock();
        sent.push(request);
        Ok(tx_id_for(sent.len() - 1))
    }

    async fn pending_nonce(&self, _account: &Address) -> Result<u64, TransportError> {
        Ok(41)
    }

    async fn network_id(&self) -> Result<ChainId, TransportError> {
        Ok(ChainId::from(1012u64))
    }

    async fn gas_price(&self) -> Result<RawAmount, TransportError> {
        Ok(RawAmount::from(100u64))
    }

    async fn wait_for_receipt(&self, tx_id: &TxId) -> Result<Receipt, TransportError> {
        Ok(Receipt {
            tx_id: *tx_id,
            gas_used: 35_000,
            success: true,
            contract_address: None,
        })
    }

    async fn unlock_account(
        &self,
        _account: &Address,
        passphrase: &str,
        _duration: Duration,
    ) -> Result<bool, TransportError> {
        Ok(passphrase == self.passphrase)
    }
}

// ---------------------------------------------------------------------------
// Output Helpers
// ---------------------------------------------------------------------------

fn word(value: u64) -> Vec<u8> {
    let mut out = vec![0u8; 24];
    out.extend(value.to_be_bytes());
    out
}

fn string_output(text: &str) -> Vec<u8> {
    let mut out = word(32);
    out.extend(word(text.len() as u64));
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(text.len().div_ceil(32) * 32, 0);
    out.extend(bytes);
    out
}

fn address_output(address: &Address) -> Vec<u8> {
    let mut out = vec![0u8; 12];
    out.extend(address.as_bytes());
    out
}

fn contract() -> Address {
    Address::from_bytes([0xc0; 20])
}

fn owner() -> Address {
    Address::from_bytes([0x0a; 20])
}

fn fungible_transport() -> ScriptedTransport {
    ScriptedTransport::default()
        .reply("name()", string_output("Newton USD"))
        .reply("symbol()", string_output("nUSD"))
        .reply("decimals()", word(6))
        .reply("totalSupply()", word(1_000_000_000_000))
        .reply("balanceOf(address)", word(5_000_000))
}

fn nft_transport() -> ScriptedTransport {
    let mut ids = word(32);
    ids.extend(word(2));
    ids.extend(word(3));
    ids.extend(word(9));
    ScriptedTransport::default()
        .reply("name()", string_output("Collectibles"))
        .reply("symbol()", string_output("COL"))
        .reply("totalSupply()", word(10))
        .reply("ownerOf(uint256)", address_output(&owner()))
        .reply("exists(uint256)", word(1))
        .reply("tokenURI(uint256)", string_output("https://example.org/token/3.json"))
        .reply("isMinter(address)", word(1))
        .reply("tokensOfOwner(address)", ids)
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fungible_summary_includes_decimals() {
    let token = Token::new(TokenKind::Fungible, contract(), Arc::new(fungible_transport()));
    let summary = token.summary().await.unwrap();

    assert_eq!(summary.kind, TokenKind::Fungible);
    assert_eq!(summary.name, "Newton USD");
    assert_eq!(summary.symbol, "nUSD");
    assert_eq!(summary.decimals, Some(Decimals::new(6).unwrap()));
    assert_eq!(summary.total_supply, RawAmount::from(1_000_000_000_000u64));
}

#[tokio::test]
async fn non_fungible_summary_skips_decimals() {
    let transport = Arc::new(nft_transport());
    let token = Token::new(TokenKind::NonFungible, contract(), Arc::clone(&transport));
    let summary = token.summary().await.unwrap();

    assert_eq!(summary.decimals, None);
    assert_eq!(summary.total_supply, RawAmount::from(10u64));
    let decimals_selector = selector("decimals()");
    assert!(transport.calls.lock().iter().all(|c| c[..4] != decimals_selector));
}

#[tokio::test]
async fn capabilities_of_the_other_standard_are_refused() {
    let nft = Token::new(TokenKind::NonFungible, contract(), Arc::new(nft_transport()));
    assert_eq!(
        nft.decimals().await,
        Err(ContractError::WrongTokenKind {
            capability: "decimals",
            expected: TokenKind::Fungible,
            actual: TokenKind::NonFungible,
        })
    );
    assert!(nft.as_fungible("batchpay").is_err());

    let erc20 = Token::new(TokenKind::Fungible, contract(), Arc::new(fungible_transport()));
    let err = erc20.as_non_fungible("mint").err().unwrap();
    assert_eq!(
        err.to_string(),
        "mint is only supported for ERC721 tokens, this contract is ERC20"
    );
}

#[tokio::test]
async fn non_fungible_reads_decode() {
    let token = Token::new(TokenKind::NonFungible, contract(), Arc::new(nft_transport()));
    let nft = token.as_non_fungible("info").unwrap();
    let id = RawAmount::from(3u64);

    assert_eq!(nft.owner_of(&id).await.unwrap(), owner());
    assert!(nft.exists(&id).await.unwrap());
    assert_eq!(nft.token_uri(&id).await.unwrap(), "https://example.org/token/3.json");
    assert!(nft.is_minter(&owner()).await.unwrap());
    assert_eq!(
        nft.tokens_of_owner(&owner()).await.unwrap(),
        vec![RawAmount::from(3u64), RawAmount::from(9u64)]
    );
}

#[tokio::test]
async fn missing_contract_is_reported() {
    let token = Token::new(TokenKind::Fungible, contract(), Arc::new(ScriptedTransport::default()));
    assert!(matches!(
        token.base().name().await,
        Err(ContractError::Abi(tokencommander_contracts::abi::AbiError::EmptyOutput))
    ));
}

// ---------------------------------------------------------------------------
// Transactions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn transfer_fills_gas_from_the_node() {
    let transport = Arc::new(fungible_transport());
    let erc20 = Erc20::new(contract(), Arc::clone(&transport));
    let to = Address::from_bytes([0x77; 20]);

    let mut opts = TransactOpts::new(owner());
    opts.nonce = Some(3);
    let sent = erc20.transfer(&opts, &to, &RawAmount::from(250u64)).await.unwrap();

    assert_eq!(sent.gas_price, RawAmount::from(100u64));
    assert_eq!(sent.gas_limit, 60_000);
    let request = &transport.sent()[0];
    assert_eq!(request.to, Some(contract()));
    assert_eq!(request.from, owner());
    assert_eq!(request.nonce, Some(3));
    assert_eq!(&request.data[..4], &[0xa9, 0x05, 0x9c, 0xbb]);
    assert_eq!(&request.data[16..36], to.as_bytes());
    assert_eq!(&request.data[36..], word(250).as_slice());
}

#[tokio::test]
async fn always_failing_estimate_is_not_sent() {
    let mut transport = fungible_transport();
    transport.estimate_error =
        Some("gas required exceeds allowance (8000000) or always failing transaction".into());
    let transport = Arc::new(transport);
    let erc20 = Erc20::new(contract(), Arc::clone(&transport));

    let result = erc20
        .transfer(&TransactOpts::new(owner()), &contract(), &RawAmount::from(1u64))
        .await;
    assert_eq!(result, Err(ContractError::WouldAlwaysFail));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn mint_with_uri_encodes_the_string() {
    let transport = Arc::new(nft_transport());
    let token = Token::new(TokenKind::NonFungible, contract(), Arc::clone(&transport));
    let nft = token.as_non_fungible("mint").unwrap();

    nft.mint_with_token_uri(&TransactOpts::new(owner()), &owner(), &RawAmount::from(11u64), "ipfs://x")
        .await
        .unwrap();

    let data = &transport.sent()[0].data;
    assert_eq!(&data[..4], &selector("mintWithTokenURI(address,uint256,string)"));
    // selector, three head words, length word, one padded text word.
    assert_eq!(data.len(), 4 + 5 * 32);
    assert_eq!(&data[4 + 4 * 32..4 + 4 * 32 + 8], b"ipfs://x");
}

#[tokio::test]
async fn deploy_sends_a_contract_creation() {
    let transport = ScriptedTransport::default();
    let bytecode = vec![0x60, 0x80, 0x60, 0x40, 0x52];
    let params = TokenParams {
        name: "Newton USD".into(),
        symbol: "NUSD".into(),
        decimals: Decimals::new(6).unwrap(),
        total_supply: RawAmount::from(1_000_000_000_000u64),
    };

    let sent = deploy(&transport, &TransactOpts::new(owner()), TokenKind::Fungible, bytecode.clone(), &params)
        .await
        .unwrap();

    assert_eq!(sent.gas_limit, 60_000);
    let request = &transport.sent()[0];
    assert_eq!(request.to, None);
    assert_eq!(request.from, owner());
    assert_eq!(&request.data[..bytecode.len()], bytecode.as_slice());
    // Decimals and total supply sit in the third and fourth head words.
    let args = &request.data[bytecode.len()..];
    assert_eq!(&args[64..96], word(6).as_slice());
    assert_eq!(&args[96..128], word(1_000_000_000_000).as_slice());
}

#[tokio::test]
async fn always_failing_deploy_is_not_sent() {
    let mut transport = ScriptedTransport::default();
    transport.estimate_error = Some("always failing transaction".into());
    let params = TokenParams {
        name: "Collectibles".into(),
        symbol: "COL".into(),
        decimals: Decimals::ZERO,
        total_supply: RawAmount::zero(),
    };

    let result = deploy(&transport, &TransactOpts::new(owner()), TokenKind::NonFungible, vec![0x60], &params).await;
    assert_eq!(result, Err(ContractError::WouldAlwaysFail));
    assert!(transport.sent().is_empty());
}

// ---------------------------------------------------------------------------
// Protocol Adapters
// ---------------------------------------------------------------------------

#[tokio::test]
async fn batch_runs_through_an_erc20_contract() {
    let transport = Arc::new(fungible_transport());
    let ledger = Erc20Ledger::new(Erc20::new(contract(), Arc::clone(&transport)));

    let planner = BatchPlanner::new(PlannerConfig::for_chain(
        Blockchain::NewChain,
        Decimals::new(6).unwrap(),
        ChainId::from(1012u64),
    ));
    let plan = planner
        .parse_source(&format!(
            "{},1.5\n{},2",
            Address::from_bytes([1; 20]),
            Address::from_bytes([2; 20])
        ))
        .unwrap();

    let mut config = ExecutorConfig::new(owner());
    config.wait_for_confirmation = true;
    let run = BatchExecutor::new(config).execute(&ledger, &plan).await;

    assert!(run.is_completed(), "{:?}", run.outcome);
    assert_eq!(run.state.gas_total, RawAmount::from(100u64 * 2 * 35_000));
    let nonces: Vec<Option<u64>> = transport.sent().iter().map(|r| r.nonce).collect();
    assert_eq!(nonces, vec![Some(41), Some(42)]);
    assert!(transport.sent().iter().all(|r| r.gas_price == RawAmount::from(100u64)));
}

struct OneAnswer(Option<String>);

impl PassphrasePrompt for OneAnswer {
    fn prompt(&mut self, _account: &Address, _attempt: u32) -> Result<String, PromptError> {
        self.0.take().ok_or_else(|| PromptError("no terminal".into()))
    }
}

#[tokio::test]
async fn node_accounts_retry_with_prompted_passphrase() {
    let transport = Arc::new(ScriptedTransport {
        passphrase: "correct horse",
        ..Default::default()
    });
    let accounts = NodeAccounts::new(transport);
    let mut prompt = OneAnswer(Some("correct horse".into()));

    let outcome = unlock_with_retries(&accounts, &owner(), Some("wrong"), &mut prompt, 2).await;
    assert_eq!(outcome, UnlockOutcome::Unlocked { attempts: 2 });
}
