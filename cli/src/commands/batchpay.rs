//! `batchpay`: plan a batch file, print the plan, execute it.
//!
//! A plan that fails to validate sends nothing. Once submission starts,
//! every transfer that reached the node is printed even when the batch
//! stops early, so the operator can reconcile by hand.

use std::fs;
use std::sync::Arc;

use anyhow::{Context, Result};

use tokencommander_contracts::{Erc20, Erc20Ledger};
use tokencommander_protocol::address::{Address, ChainId};
use tokencommander_protocol::amount::{raw_to_decimal_string, render_in_unit, Decimals, RawAmount, Unit, UnitNames};
use tokencommander_protocol::batch::{
    BatchExecutor, BatchPlan, BatchPlanner, ExecutorConfig, PaymentInstruction, PlannerConfig, SubmissionOutcome,
};

use super::Session;
use crate::cli::BatchPayArgs;

pub async fn run(session: &Session, args: &BatchPayArgs) -> Result<()> {
    let token = session.token()?;
    let erc20 = token.as_fungible("batchpay")?;
    let payer = session.settings.payer()?;

    let source = fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read batch file {}", args.file.display()))?;
    let decimals = erc20.decimals().await.context("failed to read token decimals")?;
    let symbol = erc20.base().symbol().await.context("failed to read token symbol")?;
    let blockchain = session.settings.blockchain;
    let chain_id = if blockchain.supports_tagged_addresses() {
        session.chain_id().await?
    } else {
        ChainId::default()
    };

    let planner = BatchPlanner::new(PlannerConfig::for_chain(blockchain, decimals, chain_id));
    let plan = planner
        .parse_source(&source)
        .with_context(|| format!("invalid batch file {}", args.file.display()))?;
    for line in plan_lines(&plan, decimals, &symbol) {
        println!("{line}");
    }

    session.unlock(&payer).await?;

    let executor = BatchExecutor::new(ExecutorConfig {
        payer,
        gas_price: args.price.map(RawAmount::from),
        start_nonce: args.nonce,
        wait_for_confirmation: args.wait,
    });
    let ledger = Erc20Ledger::new(Erc20::new(*erc20.base().address(), Arc::clone(&session.transport)));
    let run = executor.execute(&ledger, &plan).await;

    for (instruction, outcome) in plan.iter().zip(&run.state.outcomes) {
        for line in outcome_lines(&payer, instruction, outcome, decimals, &symbol) {
            println!("{line}");
        }
    }
    let summary = summary_lines(
        run.is_completed(),
        run.state.submitted(),
        plan.len(),
        &run.state.gas_total,
        blockchain.units(),
    );
    for line in summary {
        println!("{line}");
    }

    run.into_result()?;
    Ok(())
}

fn plan_lines(plan: &BatchPlan, decimals: Decimals, symbol: &str) -> Vec<String> {
    let mut lines = Vec::with_capacity(plan.len() + plan.warnings().len() + 3);
    lines.extend(plan.warnings().iter().map(ToString::to_string));
    lines.push("Please confirm the transactions below:".to_string());
    lines.extend(plan.iter().map(|instruction| {
        format!(
            "{},{}",
            instruction.destination(),
            raw_to_decimal_string(instruction.amount(), decimals)
        )
    }));
    lines.push(format!("Number of transactions: {}", plan.len()));
    lines.push(format!(
        "Total pay amount: {} {symbol}",
        raw_to_decimal_string(plan.total_amount(), decimals)
    ));
    lines
}

fn outcome_lines(
    payer: &Address,
    instruction: &PaymentInstruction,
    outcome: &SubmissionOutcome,
    decimals: Decimals,
    symbol: &str,
) -> Vec<String> {
    let payment = format!(
        "pay {} {symbol} from {payer} to {}",
        raw_to_decimal_string(instruction.amount(), decimals),
        instruction.destination()
    );
    match outcome {
        SubmissionOutcome::Pending => Vec::new(),
        SubmissionOutcome::Broadcast { nonce, tx_id } => {
            vec![format!("Succeed broadcast {payment} with nonce {nonce}, TxID {tx_id}")]
        }
        SubmissionOutcome::ConfirmedSuccess { nonce, tx_id, .. } => vec![
            format!("Succeed broadcast {payment} with nonce {nonce}, TxID {tx_id}"),
            format!("Succeed mined txID {tx_id}"),
        ],
        SubmissionOutcome::ConfirmedFailed { nonce, tx_id, .. } => vec![
            format!("Succeed broadcast {payment} with nonce {nonce}, TxID {tx_id}"),
            format!("Transaction {tx_id} was mined but failed"),
        ],
        SubmissionOutcome::Error {
            nonce,
            tx_id: Some(tx_id),
            cause,
        } => vec![
            format!("Succeed broadcast {payment} with nonce {nonce}, TxID {tx_id}"),
            format!("Error waiting for {tx_id}: {cause}"),
        ],
        SubmissionOutcome::Error {
            nonce,
            tx_id: None,
            cause,
        } => vec![format!("Failed to {payment} with nonce {nonce}: {cause}")],
    }
}

/// The gas total is only meaningful for a batch that ran to the end.
fn summary_lines(
    completed: bool,
    submitted: usize,
    planned: usize,
    gas_total: &RawAmount,
    units: UnitNames,
) -> Vec<String> {
    if completed {
        vec![gas_line(gas_total, units)]
    } else {
        vec![format!("Submitted {submitted} of {planned} transactions")]
    }
}

fn gas_line(gas_total: &RawAmount, units: UnitNames) -> String {
    format!("Total Gas is: {} {}", render_in_unit(gas_total, Unit::Major), units.major())
}
