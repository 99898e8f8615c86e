//! `account balance`: native coin balances of node accounts.

use anyhow::{bail, Context, Result};
use tracing::debug;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::{render_in_unit, render_with_unit_auto_select, RawAmount, Unit, UnitNames};

use super::Session;
use crate::cli::AccountBalanceArgs;

pub async fn balance(session: &Session, args: &AccountBalanceArgs) -> Result<()> {
    let units = session.units();
    let unit = args.unit.as_deref().map(|name| parse_unit(name, units)).transpose()?;
    let addresses = addresses(session, &args.addresses).await?;

    let mut balances = Vec::with_capacity(addresses.len());
    for address in addresses {
        let balance = session
            .transport
            .balance(&address)
            .await
            .with_context(|| format!("failed to get the balance of {address}"))?;
        println!("Address[{address}] Balance[{}]", render(&balance, unit, units));
        balances.push(balance);
    }

    if args.sum || balances.len() > 1 {
        for line in summary_lines(&balances, unit, units) {
            println!("{line}");
        }
    }
    Ok(())
}

async fn addresses(session: &Session, given: &[String]) -> Result<Vec<Address>> {
    if !given.is_empty() {
        let mut parsed = Vec::with_capacity(given.len());
        for text in given {
            parsed.push(session.parse_address(text).await?);
        }
        return Ok(parsed);
    }
    let accounts = session
        .transport
        .accounts()
        .await
        .context("failed to list the node accounts")?;
    debug!(count = accounts.len(), "node accounts");
    if accounts.is_empty() {
        return Ok(vec![session.settings.payer()?]);
    }
    Ok(accounts)
}

/// Matches the chain's unit names, ignoring case.
pub fn parse_unit(name: &str, units: UnitNames) -> Result<Unit> {
    [Unit::Major, Unit::Minor]
        .into_iter()
        .find(|unit| units.name(*unit).eq_ignore_ascii_case(name))
        .map_or_else(
            || bail!("unknown unit '{name}', expected {} or {}", units.major(), units.minor()),
            Ok,
        )
}

pub fn render(raw: &RawAmount, unit: Option<Unit>, units: UnitNames) -> String {
    match unit {
        Some(unit) => format!("{} {}", render_in_unit(raw, unit), units.name(unit)),
        None => render_with_unit_auto_select(raw, units),
    }
}

pub fn summary_lines(balances: &[RawAmount], unit: Option<Unit>, units: UnitNames) -> Vec<String> {
    let total: RawAmount = balances.iter().sum();
    vec![
        format!("Number Of Accounts: {}", balances.len()),
        format!("Total Balance: {}", render(&total, unit, units)),
    ]
}
