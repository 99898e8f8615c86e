//! `add`: save a contract under a symbol in the settings file.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};

use tokencommander_contracts::BaseToken;
use tokencommander_protocol::address::Address;
use tokencommander_protocol::config::ContractAdded;

use super::Session;
use crate::cli::AddArgs;
use crate::settings::SettingsFile;

pub async fn run(session: &Session, file: &mut SettingsFile, path: &Path, args: &AddArgs) -> Result<()> {
    let contract = Address::parse_hex(&args.contract)
        .with_context(|| format!("invalid contract address '{}'", args.contract))?;

    let symbol = match &args.symbol {
        Some(symbol) => symbol.clone(),
        None => BaseToken::new(contract, Arc::clone(&session.transport))
            .symbol()
            .await
            .context("failed to read the contract symbol, pass one explicitly")?,
    };

    match file.add_contract(&symbol, contract)? {
        ContractAdded::Added => {
            file.save(path)?;
            println!("Contract {contract} saved as {symbol}");
        }
        ContractAdded::AlreadyPresent => println!("Contract {contract} was already saved as {symbol}"),
    }
    Ok(())
}
