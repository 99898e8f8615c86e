//! `balance`: token balance per address.

use anyhow::{bail, Context, Result};
use tracing::warn;

use tokencommander_contracts::Token;
use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::{raw_to_decimal_string, RawAmount};

use super::Session;

pub async fn run(session: &Session, addresses: &[String]) -> Result<()> {
    let token = session.token()?;
    let owners = owners(session, addresses).await?;
    let symbol = token.base().symbol().await.context("failed to read token symbol")?;

    match &token {
        Token::Fungible(erc20) => {
            let decimals = erc20.decimals().await.context("failed to read token decimals")?;
            for owner in &owners {
                let balance = erc20
                    .base()
                    .balance_of(owner)
                    .await
                    .with_context(|| format!("failed to read the balance of {owner}"))?;
                println!("{owner} {} {symbol}", raw_to_decimal_string(&balance, decimals));
            }
        }
        Token::NonFungible(nft) => {
            for owner in &owners {
                let balance = nft
                    .base()
                    .balance_of(owner)
                    .await
                    .with_context(|| format!("failed to read the balance of {owner}"))?;
                println!("{owner} {balance} {symbol}");
                if balance.is_zero() {
                    continue;
                }
                // tokensOfOwner is an optional extension.
                match nft.tokens_of_owner(owner).await {
                    Ok(ids) => println!("\tTokens: {}", join_ids(&ids)),
                    Err(e) => warn!(%owner, error = %e, "could not list owned tokens"),
                }
            }
        }
    }
    Ok(())
}

/// Invalid addresses are reported and skipped. With no addresses at all the
/// `from` account is used.
async fn owners(session: &Session, addresses: &[String]) -> Result<Vec<Address>> {
    if addresses.is_empty() {
        return Ok(vec![session.settings.payer()?]);
    }
    let mut owners = Vec::with_capacity(addresses.len());
    for text in addresses {
        match session.parse_address(text).await {
            Ok(address) => owners.push(address),
            Err(e) => warn!(address = %text, error = %e, "skipping invalid address"),
        }
    }
    if owners.is_empty() {
        bail!("no valid address given");
    }
    Ok(owners)
}

fn join_ids(ids: &[RawAmount]) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}
