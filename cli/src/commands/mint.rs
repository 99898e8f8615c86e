//! `mint`: create an ERC721 token, optionally with a token URI.

use anyhow::{bail, Context, Result};
use tracing::info;

use tokencommander_contracts::TransactOpts;

use super::{parse_token_id, Session};
use crate::cli::MintArgs;

pub async fn run(session: &Session, args: &MintArgs) -> Result<()> {
    let token = session.token()?;
    let nft = token.as_non_fungible("mint")?;
    let from = session.settings.payer()?;

    let is_minter = nft
        .is_minter(&from)
        .await
        .context("failed to check the minter role")?;
    if !is_minter {
        bail!("{from} is not a minter of contract {}", nft.base().address());
    }

    let to = session.parse_address(&args.address).await?;
    let token_id = match &args.token_id {
        Some(text) => parse_token_id(text)?,
        // Sequential ids: the next one is the current supply.
        None => nft.base().total_supply().await.context("failed to read total supply")?,
    };
    if nft.exists(&token_id).await.context("failed to check token existence")? {
        bail!("token {token_id} already exists");
    }

    session.unlock(&from).await?;
    let opts = TransactOpts::new(from);
    info!(%to, %token_id, uri = ?args.uri, "sending mint");
    let sent = match &args.uri {
        Some(uri) => nft.mint_with_token_uri(&opts, &to, &token_id, uri).await,
        None => nft.mint(&opts, &to, &token_id).await,
    }
    .context("failed to send the mint transaction")?;
    println!("Mint token {token_id} to {to}");

    session.confirm(&sent, false).await
}
