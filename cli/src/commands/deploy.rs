//! `deploy`: create a token contract from compiled bytecode.

use std::fs;
use std::path::Path;

use anyhow::{anyhow, bail, Context, Result};
use tracing::info;

use tokencommander_contracts::{deploy, ContractTransport, TokenParams, TransactOpts};
use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::{decimal_string_to_raw, Decimals};

use super::Session;
use crate::cli::DeployArgs;
use crate::settings::SettingsFile;

pub async fn run(session: &Session, file: &mut SettingsFile, path: &Path, args: &DeployArgs) -> Result<()> {
    let symbol = session
        .settings
        .symbol
        .clone()
        .ok_or_else(|| anyhow!("the token symbol is not set, pass --symbol"))?;
    let params = token_params(&args.name, &symbol, &args.total, args.decimals)?;
    let bytecode = read_bytecode(&args.bytecode)?;

    let from = session.settings.payer()?;
    session.unlock(&from).await?;
    let opts = TransactOpts::new(from);
    info!(kind = %session.settings.token_kind, name = %params.name, symbol = %params.symbol, "sending deploy");
    let sent = deploy(
        session.transport.as_ref(),
        &opts,
        session.settings.token_kind,
        bytecode,
        &params,
    )
    .await
    .context("failed to send the deploy transaction")?;
    println!("Transaction waiting to be mined: {}", sent.tx_id);

    let receipt = session
        .transport
        .wait_for_receipt(&sent.tx_id)
        .await
        .with_context(|| format!("failed to get the receipt of {}", sent.tx_id))?;
    if !receipt.success {
        bail!("the deploy transaction {} failed", sent.tx_id);
    }
    let contract = receipt
        .contract_address
        .ok_or_else(|| anyhow!("the receipt of {} has no contract address", sent.tx_id))?;
    println!("Contract deploy at address {contract}");
    println!("Contract deploy success");

    if remember_contract(file, contract, args.save) {
        file.save(path)?;
        println!("Contract {contract} saved as the default contract");
    }
    Ok(())
}

/// `total` is in token units and scaled by `decimals`.
pub fn token_params(name: &str, symbol: &str, total: &str, decimals: u8) -> Result<TokenParams> {
    let decimals = Decimals::new(u32::from(decimals))?;
    let total_supply =
        decimal_string_to_raw(total, decimals).with_context(|| format!("invalid total supply '{total}'"))?;
    Ok(TokenParams {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals,
        total_supply,
    })
}

pub fn read_bytecode(path: &Path) -> Result<Vec<u8>> {
    let text = fs::read_to_string(path).with_context(|| format!("failed to read bytecode file {}", path.display()))?;
    parse_bytecode(&text).with_context(|| format!("invalid bytecode in {}", path.display()))
}

/// Hex text, with or without `0x`. Surrounding whitespace is ignored.
pub fn parse_bytecode(text: &str) -> Result<Vec<u8>> {
    let text = text.trim();
    let digits = text.strip_prefix("0x").unwrap_or(text);
    if digits.is_empty() {
        bail!("bytecode is empty");
    }
    Ok(hex::decode(digits)?)
}

/// Sets the default contract when asked to, or when there is none yet.
/// Returns whether the file changed.
pub fn remember_contract(file: &mut SettingsFile, contract: Address, force: bool) -> bool {
    let unset = file.contract_address.as_deref().map_or(true, str::is_empty);
    if !force && !unset {
        return false;
    }
    file.contract_address = Some(contract.to_string());
    true
}
