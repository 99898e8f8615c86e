//! `info`: what the configured contract is, and for ERC721 what a single
//! token id is.

use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use tokencommander_contracts::TokenSummary;
use tokencommander_protocol::amount::raw_to_decimal_string;

use super::{parse_token_id, Session};

const METADATA_TIMEOUT: Duration = Duration::from_secs(10);

pub async fn run(session: &Session, token_id: Option<&str>) -> Result<()> {
    let token = session.token()?;
    let summary = token.summary().await.context("failed to read token information")?;
    for line in summary_lines(&summary) {
        println!("{line}");
    }

    let Some(token_id) = token_id else {
        return Ok(());
    };
    let nft = token.as_non_fungible("token details")?;
    let token_id = parse_token_id(token_id)?;

    if !nft.exists(&token_id).await.context("failed to check token existence")? {
        println!("Token {token_id} does not exist");
        return Ok(());
    }
    let owner = nft.owner_of(&token_id).await.context("failed to read token owner")?;
    let uri = nft.token_uri(&token_id).await.context("failed to read token URI")?;
    println!("TokenID: {token_id}");
    println!("Owner: {owner}");
    println!("URI: {uri}");

    if uri.starts_with("http://") || uri.starts_with("https://") {
        match fetch_metadata(&uri).await {
            Ok(metadata) => println!("Metadata: {metadata}"),
            Err(e) => warn!(%uri, error = %e, "could not fetch token metadata"),
        }
    }
    Ok(())
}

fn summary_lines(summary: &TokenSummary) -> Vec<String> {
    let mut lines = vec![
        format!("Contract: {}", summary.address),
        format!("Standard: {}", summary.kind),
        format!("Name: {}", summary.name),
        format!("Symbol: {}", summary.symbol),
    ];
    match summary.decimals {
        Some(decimals) => {
            lines.push(format!("Decimals: {}", decimals.get()));
            lines.push(format!(
                "TotalSupply: {} {}",
                raw_to_decimal_string(&summary.total_supply, decimals),
                summary.symbol
            ));
        }
        None => lines.push(format!("TotalSupply: {}", summary.total_supply)),
    }
    lines
}

/// Token URIs usually point at a JSON document. Pretty-printed when it is
/// JSON, passed through otherwise.
async fn fetch_metadata(uri: &str) -> Result<String> {
    debug!(%uri, "fetching token metadata");
    let body = reqwest::Client::builder()
        .timeout(METADATA_TIMEOUT)
        .build()?
        .get(uri)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    Ok(match serde_json::from_str::<serde_json::Value>(&body) {
        Ok(json) => serde_json::to_string_pretty(&json)?,
        Err(_) => body,
    })
}
