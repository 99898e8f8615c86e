//! # Batch Planner
//!
//! Turns `<address>,<amount>` lines into a [`BatchPlan`]. Either every line
//! validates and a complete plan comes back, or the first bad line is
//! reported and nothing is returned.

use thiserror::Error;
use tracing::{debug, warn};

use super::types::{BatchPlan, PaymentInstruction, PlanWarning};
use crate::address::{parse_destination, AddressError, ChainId};
use crate::amount::{decimal_string_to_raw, AmountError, Decimals};
use crate::config::Blockchain;

/// Everything the planner needs to know about the token and the chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlannerConfig {
    pub decimals: Decimals,
    /// Chain that tagged destinations must belong to.
    pub chain_id: ChainId,
    /// Whether `NEW…` destinations are accepted at all.
    pub tagged_addresses: bool,
}

impl PlannerConfig {
    pub fn for_chain(blockchain: Blockchain, decimals: Decimals, chain_id: ChainId) -> Self {
        Self {
            decimals,
            chain_id,
            tagged_addresses: blockchain.supports_tagged_addresses(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("line {line}: malformed batch line '{text}', expected <address>,<amount>")]
    MalformedLine { line: usize, text: String },

    #[error("line {line}: invalid address in '{text}': {source}")]
    InvalidAddress {
        line: usize,
        text: String,
        source: AddressError,
    },

    #[error("line {line}: invalid amount in '{text}': {source}")]
    InvalidAmount {
        line: usize,
        text: String,
        source: AmountError,
    },

    #[error("batch is empty or its total amount is zero")]
    EmptyOrZeroBatch,
}

pub struct BatchPlanner {
    config: PlannerConfig,
}

impl BatchPlanner {
    pub fn new(config: PlannerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans a whole batch file's contents.
    pub fn parse_source(&self, source: &str) -> Result<BatchPlan, PlanError> {
        self.build_plan(source.split('\n'))
    }

    /// Plans the given lines. Line numbers are 1-based positions in `lines`,
    /// counting skipped blank lines.
    pub fn build_plan<I, S>(&self, lines: I) -> Result<BatchPlan, PlanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut instructions = Vec::new();
        let mut warnings = Vec::new();

        for (idx, raw_line) in lines.into_iter().enumerate() {
            let line_no = idx + 1;
            let text = raw_line.as_ref();
            let text = text.strip_suffix('\r').unwrap_or(text);
            if text.is_empty() {
                continue;
            }

            let instruction = self.parse_line(line_no, text)?;
            if instruction.destination().is_zero() {
                warn!(line = line_no, "batch pays the zero address");
                warnings.push(PlanWarning::ZeroAddress { line: line_no });
            }
            instructions.push(instruction);
        }

        let plan = BatchPlan::from_instructions(instructions, warnings);

        if plan.total_amount().is_zero() {
            return Err(PlanError::EmptyOrZeroBatch);
        }

        debug!(
            instructions = plan.len(),
            total = %plan.total_amount(),
            "batch plan built"
        );
        Ok(plan)
    }

    fn parse_line(&self, line: usize, text: &str) -> Result<PaymentInstruction, PlanError> {
        let fields: Vec<&str> = text.split(',').collect();
        let [address_field, amount_field] = fields.as_slice() else {
            return Err(PlanError::MalformedLine {
                line,
                text: text.to_string(),
            });
        };

        let tagged_chain = self.config.tagged_addresses.then_some(&self.config.chain_id);
        let destination =
            parse_destination(address_field, tagged_chain).map_err(|source| PlanError::InvalidAddress {
                line,
                text: text.to_string(),
                source,
            })?;

        let amount = decimal_string_to_raw(amount_field, self.config.decimals).map_err(|source| {
            PlanError::InvalidAmount {
                line,
                text: text.to_string(),
                source,
            }
        })?;

        Ok(PaymentInstruction::new(destination, amount, line))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
