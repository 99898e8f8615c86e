//! End-to-end batch payment tests.
//!
//! A batch file goes through the planner and the executor against an
//! in-memory token ledger that actually moves balances, so the tests can
//! check what ended up where, not just what was attempted.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use tokencommander_protocol::address::{encode_tagged, Address, ChainId};
use tokencommander_protocol::amount::{decimal_string_to_raw, Decimals, RawAmount};
use tokencommander_protocol::batch::{
    BatchError, BatchExecutor, BatchOutcome, BatchPlanner, ExecutorConfig, PlanError, PlannerConfig,
    SubmissionOutcome,
};
use tokencommander_protocol::config::Blockchain;
use tokencommander_protocol::ledger::{
    Confirmation, Ledger, LedgerError, SubmittedTransfer, TransferRequest, TxId,
};

// ---------------------------------------------------------------------------
// In-Memory Ledger
// ---------------------------------------------------------------------------

const GAS_PER_TRANSFER: u64 = 52_000;

struct MemoryLedger {
    chain_id: ChainId,
    inner: RwLock<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    balances: HashMap<Address, RawAmount>,
    nonces: HashMap<Address, u64>,
    mined: HashMap<TxId, Confirmation>,
    /// Destinations that make the token contract revert.
    blocked: Vec<Address>,
}

impl MemoryLedger {
    fn new(chain_id: u64) -> Self {
        Self {
            chain_id: ChainId::from(chain_id),
            inner: RwLock::new(LedgerState::default()),
        }
    }

    fn fund(&self, account: Address, amount: u64) {
        self.inner.write().balances.insert(account, RawAmount::from(amount));
    }

    fn block(&self, account: Address) {
        self.inner.write().blocked.push(account);
    }

    fn balance(&self, account: &Address) -> RawAmount {
        self.inner.read().balances.get(account).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn balance_of(&self, owner: &Address) -> Result<RawAmount, LedgerError> {
        Ok(self.balance(owner))
    }

    async fn pending_nonce(&self, account: &Address) -> Result<u64, LedgerError> {
        Ok(self.inner.read().nonces.get(account).copied().unwrap_or(0))
    }

    async fn network_chain_id(&self) -> Result<ChainId, LedgerError> {
        Ok(self.chain_id.clone())
    }

    async fn suggest_gas_price(&self) -> Result<RawAmount, LedgerError> {
        Ok(RawAmount::from(1_000_000_000u64))
    }

    async fn transfer(&self, request: TransferRequest) -> Result<SubmittedTransfer, LedgerError> {
        let mut state = self.inner.write();
        let expected = state.nonces.get(&request.from).copied().unwrap_or(0);
        if request.nonce != expected {
            return Err(LedgerError::Rejected(format!(
                "nonce {} does not match expected {expected}",
                request.nonce
            )));
        }
        if state.blocked.contains(&request.to) {
            return Err(LedgerError::from_submission_message(
                "gas required exceeds allowance (8000000) or always failing transaction",
            ));
        }

        let from_balance = state.balances.get(&request.from).cloned().unwrap_or_default();
        if from_balance < request.amount {
            return Err(LedgerError::Rejected("transfer amount exceeds balance".into()));
        }
        let remaining = from_balance.into_biguint() - request.amount.as_biguint();
        state.balances.insert(request.from, RawAmount::from(remaining));
        *state.balances.entry(request.to).or_default() += &request.amount;
        state.nonces.insert(request.from, expected + 1);

        let mut hash = [0u8; 32];
        hash[..20].copy_from_slice(request.from.as_bytes());
        hash[24..].copy_from_slice(&request.nonce.to_be_bytes());
        let tx_id = TxId::from_bytes(hash);
        state.mined.insert(
            tx_id,
            Confirmation {
                gas_used: GAS_PER_TRANSFER,
                success: true,
            },
        );
        Ok(SubmittedTransfer {
            tx_id,
            gas_limit: GAS_PER_TRANSFER * 2,
        })
    }

    async fn wait_confirmed(&self, tx_id: &TxId) -> Result<Confirmation, LedgerError> {
        self.inner
            .read()
            .mined
            .get(tx_id)
            .copied()
            .ok_or(LedgerError::ConfirmationTimeout(*tx_id))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn payer() -> Address {
    Address::from_bytes([0xee; 20])
}

fn recipient(byte: u8) -> Address {
    Address::from_bytes([byte; 20])
}

fn six_decimals() -> Decimals {
    Decimals::new(6).unwrap()
}

async fn planner_for(ledger: &MemoryLedger) -> BatchPlanner {
    let chain_id = ledger.network_chain_id().await.unwrap();
    BatchPlanner::new(PlannerConfig::for_chain(Blockchain::NewChain, six_decimals(), chain_id))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mixed_address_forms_are_paid_in_order() {
    let ledger = MemoryLedger::new(1012);
    ledger.fund(payer(), 10_000_000);

    let tagged = encode_tagged(&ChainId::from(1012u64), &recipient(0x22));
    let source = format!(
        "{},1.5\n{tagged},2.25\r\n\n{},0.000001\n",
        recipient(0x11).to_hex_lower(),
        recipient(0x33),
    );
    let plan = planner_for(&ledger).await.parse_source(&source).unwrap();
    assert_eq!(
        plan.total_amount(),
        &decimal_string_to_raw("3.750001", six_decimals()).unwrap()
    );

    let run = BatchExecutor::new(ExecutorConfig::new(payer())).execute(&ledger, &plan).await;
    assert!(run.is_completed(), "{:?}", run.outcome);

    assert_eq!(ledger.balance(&recipient(0x11)), RawAmount::from(1_500_000u64));
    assert_eq!(ledger.balance(&recipient(0x22)), RawAmount::from(2_250_000u64));
    assert_eq!(ledger.balance(&recipient(0x33)), RawAmount::from(1u64));
    assert_eq!(ledger.balance(&payer()), RawAmount::from(6_249_999u64));
    assert_eq!(ledger.pending_nonce(&payer()).await.unwrap(), 3);

    // Without waiting, gas is accounted at the requested limit.
    assert_eq!(
        run.state.gas_total,
        RawAmount::from(1_000_000_000u64).mul_u64(3 * GAS_PER_TRANSFER * 2)
    );
}

#[tokio::test]
async fn waiting_accounts_actual_gas() {
    let ledger = MemoryLedger::new(1012);
    ledger.fund(payer(), 10_000_000);
    let source = format!("{},1\n{},1", recipient(1), recipient(2));
    let plan = planner_for(&ledger).await.parse_source(&source).unwrap();

    let mut config = ExecutorConfig::new(payer());
    config.wait_for_confirmation = true;
    config.gas_price = Some(RawAmount::from(5u64));
    let run = BatchExecutor::new(config).execute(&ledger, &plan).await;

    assert_eq!(run.into_result().unwrap(), RawAmount::from(5 * 2 * GAS_PER_TRANSFER));
}

#[tokio::test]
async fn always_failing_transfer_stops_the_batch() {
    let ledger = MemoryLedger::new(1012);
    ledger.fund(payer(), 10_000_000);
    ledger.block(recipient(2));
    let source = format!("{},1\n{},1\n{},1", recipient(1), recipient(2), recipient(3));
    let plan = planner_for(&ledger).await.parse_source(&source).unwrap();

    let run = BatchExecutor::new(ExecutorConfig::new(payer())).execute(&ledger, &plan).await;

    assert_eq!(
        run.outcome,
        BatchOutcome::AbortedAtIndex {
            index: 1,
            cause: BatchError::SubmissionFailed {
                index: 1,
                cause: LedgerError::WouldAlwaysFail,
            },
        }
    );
    assert!(matches!(run.state.outcomes[0], SubmissionOutcome::Broadcast { nonce: 0, .. }));
    assert_eq!(run.state.outcomes[2], SubmissionOutcome::Pending);
    // The first payment is not rolled back.
    assert_eq!(ledger.balance(&recipient(1)), RawAmount::from(1_000_000u64));
    assert_eq!(ledger.balance(&recipient(3)), RawAmount::zero());
}

#[tokio::test]
async fn stale_nonce_override_is_rejected_by_the_ledger() {
    let ledger = MemoryLedger::new(1012);
    ledger.fund(payer(), 10_000_000);
    let plan = planner_for(&ledger)
        .await
        .parse_source(&format!("{},1", recipient(1)))
        .unwrap();

    let mut config = ExecutorConfig::new(payer());
    config.start_nonce = Some(7);
    let run = BatchExecutor::new(config).execute(&ledger, &plan).await;

    assert!(matches!(
        run.outcome,
        BatchOutcome::AbortedAtIndex {
            index: 0,
            cause: BatchError::SubmissionFailed {
                cause: LedgerError::Rejected(_),
                ..
            },
        }
    ));
    assert_eq!(run.state.submitted(), 0);
}

#[tokio::test]
async fn underfunded_batch_never_reaches_the_ledger() {
    let ledger = MemoryLedger::new(1012);
    ledger.fund(payer(), 399);
    let planner = BatchPlanner::new(PlannerConfig::for_chain(
        Blockchain::NewChain,
        Decimals::new(2).unwrap(),
        ChainId::from(1012u64),
    ));
    let plan = planner
        .build_plan([
            format!("{},1.5", recipient(0xaa)),
            format!("{},2.5", recipient(0xbb)),
        ])
        .unwrap();

    let run = BatchExecutor::new(ExecutorConfig::new(payer())).execute(&ledger, &plan).await;

    assert!(matches!(
        run.outcome,
        BatchOutcome::AbortedPreflight(BatchError::InsufficientFunds { .. })
    ));
    assert_eq!(ledger.pending_nonce(&payer()).await.unwrap(), 0);
    assert_eq!(ledger.balance(&payer()), RawAmount::from(399u64));
}

#[tokio::test]
async fn tagged_address_for_another_chain_fails_planning() {
    let ledger = MemoryLedger::new(1012);
    let foreign = encode_tagged(&ChainId::from(1007u64), &recipient(5));
    let err = planner_for(&ledger)
        .await
        .parse_source(&format!("{},1\n{foreign},1", recipient(4)))
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidAddress { line: 2, .. }));
}

#[tokio::test]
async fn ethereum_mode_rejects_tagged_addresses() {
    let tagged = encode_tagged(&ChainId::from(1u64), &recipient(5));
    let planner = BatchPlanner::new(PlannerConfig::for_chain(
        Blockchain::Ethereum,
        six_decimals(),
        ChainId::from(1u64),
    ));
    assert!(matches!(
        planner.build_plan([format!("{tagged},1")]),
        Err(PlanError::InvalidAddress { line: 1, .. })
    ));
}
