//! # Batch Executor
//!
//! Runs a [`BatchPlan`] against a [`Ledger`], one instruction at a time:
//!
//! ```text
//! preflight ─▶ sequence nonces ─▶ submit #0 ─▶ [wait #0] ─▶ submit #1 ─▶ …
//!     │                              │             │
//!     ▼                              ▼             ▼
//! AbortedPreflight            AbortedAtIndex  AbortedAtIndex
//! ```
//!
//! Nothing already broadcast is ever rolled back. The returned
//! [`BatchRun`] always carries the full execution state so the operator
//! can see exactly which transfers made it onto the ledger.

use thiserror::Error;
use tracing::{debug, info, warn};

use super::types::BatchPlan;
use crate::address::Address;
use crate::amount::RawAmount;
use crate::ledger::{Ledger, LedgerError, TransferRequest, TxId};

/// Per-run settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Account every transfer is sent from.
    pub payer: Address,
    /// Batch-wide gas price. `None` asks the ledger once during preflight.
    pub gas_price: Option<RawAmount>,
    /// First nonce. `None` uses the payer's pending nonce.
    pub start_nonce: Option<u64>,
    /// Wait for each receipt before sending the next transfer.
    pub wait_for_confirmation: bool,
}

impl ExecutorConfig {
    pub fn new(payer: Address) -> Self {
        Self {
            payer,
            gas_price: None,
            start_nonce: None,
            wait_for_confirmation: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Execution State
// ---------------------------------------------------------------------------

/// What happened to one instruction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// Not reached (yet).
    Pending,
    /// Accepted by the node, receipt not awaited.
    Broadcast { nonce: u64, tx_id: TxId },
    ConfirmedSuccess { nonce: u64, tx_id: TxId, gas_used: u64 },
    /// Mined but reverted. The nonce and the gas are spent regardless.
    ConfirmedFailed { nonce: u64, tx_id: TxId, gas_used: u64 },
    /// Submission or confirmation failed. `tx_id` is set when the
    /// transaction was broadcast before the failure.
    Error {
        nonce: u64,
        tx_id: Option<TxId>,
        cause: LedgerError,
    },
}

impl SubmissionOutcome {
    pub fn tx_id(&self) -> Option<&TxId> {
        match self {
            SubmissionOutcome::Pending => None,
            SubmissionOutcome::Broadcast { tx_id, .. }
            | SubmissionOutcome::ConfirmedSuccess { tx_id, .. }
            | SubmissionOutcome::ConfirmedFailed { tx_id, .. } => Some(tx_id),
            SubmissionOutcome::Error { tx_id, .. } => tx_id.as_ref(),
        }
    }

    pub fn nonce(&self) -> Option<u64> {
        match self {
            SubmissionOutcome::Pending => None,
            SubmissionOutcome::Broadcast { nonce, .. }
            | SubmissionOutcome::ConfirmedSuccess { nonce, .. }
            | SubmissionOutcome::ConfirmedFailed { nonce, .. }
            | SubmissionOutcome::Error { nonce, .. } => Some(*nonce),
        }
    }
}

/// Mutable state of one run. Owned by the executor while running, handed
/// to the caller afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchExecutionState {
    /// Nonce the next submission will use. `None` before sequencing, or
    /// after the nonce space is exhausted.
    pub next_nonce: Option<u64>,
    pub gas_price: Option<RawAmount>,
    pub gas_total: RawAmount,
    pub outcomes: Vec<SubmissionOutcome>,
}

impl BatchExecutionState {
    fn new(instructions: usize) -> Self {
        Self {
            next_nonce: None,
            gas_price: None,
            gas_total: RawAmount::zero(),
            outcomes: vec![SubmissionOutcome::Pending; instructions],
        }
    }

    /// Transaction ids of everything that reached the ledger, in order.
    pub fn tx_ids(&self) -> Vec<TxId> {
        self.outcomes.iter().filter_map(|o| o.tx_id().copied()).collect()
    }

    /// Number of instructions that reached the ledger.
    pub fn submitted(&self) -> usize {
        self.outcomes.iter().filter(|o| o.tx_id().is_some()).count()
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BatchError {
    #[error("insufficient funds: balance {balance}, batch needs {required}")]
    InsufficientFunds { balance: RawAmount, required: RawAmount },

    #[error("preflight failed: {0}")]
    Preflight(LedgerError),

    #[error("submission {index} failed: {cause}")]
    SubmissionFailed { index: usize, cause: LedgerError },

    #[error("confirmation of submission {index} ({tx_id}) failed: {cause}")]
    ConfirmationFailed {
        index: usize,
        tx_id: TxId,
        cause: LedgerError,
    },

    #[error("nonce space exhausted at submission {index}")]
    NonceOverflow { index: usize },
}

/// Terminal state of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchOutcome {
    Completed { gas_total: RawAmount, tx_ids: Vec<TxId> },
    AbortedPreflight(BatchError),
    AbortedAtIndex { index: usize, cause: BatchError },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRun {
    pub outcome: BatchOutcome,
    pub state: BatchExecutionState,
}

impl BatchRun {
    pub fn is_completed(&self) -> bool {
        matches!(self.outcome, BatchOutcome::Completed { .. })
    }

    /// Collapses the run into the total gas, or the reason it stopped.
    pub fn into_result(self) -> Result<RawAmount, BatchError> {
        match self.outcome {
            BatchOutcome::Completed { gas_total, .. } => Ok(gas_total),
            BatchOutcome::AbortedPreflight(e) | BatchOutcome::AbortedAtIndex { cause: e, .. } => Err(e),
        }
    }
}

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

pub struct BatchExecutor {
    config: ExecutorConfig,
}

impl BatchExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Executes `plan`. Ledger calls are awaited strictly in sequence.
    pub async fn execute<L>(&self, ledger: &L, plan: &BatchPlan) -> BatchRun
    where
        L: Ledger + ?Sized,
    {
        let mut state = BatchExecutionState::new(plan.len());

        let (gas_price, start_nonce) = match self.preflight(ledger, plan).await {
            Ok(sequencing) => sequencing,
            Err(e) => {
                warn!(error = %e, "batch aborted before any submission");
                return BatchRun {
                    outcome: BatchOutcome::AbortedPreflight(e),
                    state,
                };
            }
        };
        state.gas_price = Some(gas_price.clone());
        state.next_nonce = Some(start_nonce);
        info!(
            instructions = plan.len(),
            start_nonce,
            gas_price = %gas_price,
            wait = self.config.wait_for_confirmation,
            "batch execution started"
        );

        for (index, instruction) in plan.iter().enumerate() {
            let Some(nonce) = state.next_nonce else {
                return abort(state, index, BatchError::NonceOverflow { index });
            };

            let request = TransferRequest {
                from: self.config.payer,
                to: *instruction.destination(),
                amount: instruction.amount().clone(),
                nonce,
                gas_price: gas_price.clone(),
            };
            let submitted = match ledger.transfer(request).await {
                Ok(submitted) => submitted,
                Err(cause) => {
                    warn!(index, nonce, error = %cause, "transfer submission failed");
                    state.outcomes[index] = SubmissionOutcome::Error {
                        nonce,
                        tx_id: None,
                        cause: cause.clone(),
                    };
                    return abort(state, index, BatchError::SubmissionFailed { index, cause });
                }
            };
            let tx_id = submitted.tx_id;
            state.next_nonce = nonce.checked_add(1);
            info!(index, nonce, %tx_id, to = %instruction.destination(), "transfer broadcast");

            if !self.config.wait_for_confirmation {
                state.gas_total += &gas_price.mul_u64(submitted.gas_limit);
                state.outcomes[index] = SubmissionOutcome::Broadcast { nonce, tx_id };
                continue;
            }

            match ledger.wait_confirmed(&tx_id).await {
                Ok(confirmation) => {
                    state.gas_total += &gas_price.mul_u64(confirmation.gas_used);
                    state.outcomes[index] = if confirmation.success {
                        debug!(index, %tx_id, gas_used = confirmation.gas_used, "transfer confirmed");
                        SubmissionOutcome::ConfirmedSuccess {
                            nonce,
                            tx_id,
                            gas_used: confirmation.gas_used,
                        }
                    } else {
                        warn!(index, %tx_id, gas_used = confirmation.gas_used, "transfer mined but failed");
                        SubmissionOutcome::ConfirmedFailed {
                            nonce,
                            tx_id,
                            gas_used: confirmation.gas_used,
                        }
                    };
                }
                Err(cause) => {
                    warn!(index, %tx_id, error = %cause, "waiting for confirmation failed");
                    state.outcomes[index] = SubmissionOutcome::Error {
                        nonce,
                        tx_id: Some(tx_id),
                        cause: cause.clone(),
                    };
                    return abort(state, index, BatchError::ConfirmationFailed { index, tx_id, cause });
                }
            }
        }

        info!(gas_total = %state.gas_total, submitted = state.submitted(), "batch execution completed");
        BatchRun {
            outcome: BatchOutcome::Completed {
                gas_total: state.gas_total.clone(),
                tx_ids: state.tx_ids(),
            },
            state,
        }
    }

    /// Balance check, then gas price and start nonce.
    async fn preflight<L>(&self, ledger: &L, plan: &BatchPlan) -> Result<(RawAmount, u64), BatchError>
    where
        L: Ledger + ?Sized,
    {
        let payer = &self.config.payer;
        let balance = ledger.balance_of(payer).await.map_err(BatchError::Preflight)?;
        if &balance < plan.total_amount() {
            return Err(BatchError::InsufficientFunds {
                balance,
                required: plan.total_amount().clone(),
            });
        }

        let gas_price = match &self.config.gas_price {
            Some(price) => price.clone(),
            None => ledger.suggest_gas_price().await.map_err(BatchError::Preflight)?,
        };
        let start_nonce = match self.config.start_nonce {
            Some(nonce) => nonce,
            None => ledger.pending_nonce(payer).await.map_err(BatchError::Preflight)?,
        };
        Ok((gas_price, start_nonce))
    }
}

fn abort(state: BatchExecutionState, index: usize, cause: BatchError) -> BatchRun {
    BatchRun {
        outcome: BatchOutcome::AbortedAtIndex { index, cause },
        state,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
