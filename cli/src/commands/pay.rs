//! `pay`: one transfer. An ERC20 amount in token units (or `all`), or an
//! ERC721 token id.

use anyhow::{bail, Context, Result};
use tracing::{info, warn};

use tokencommander_contracts::{Token, TransactOpts};
use tokencommander_protocol::amount::{decimal_string_to_raw, raw_to_decimal_string, Decimals, RawAmount};

use super::{parse_token_id, Session};
use crate::cli::PayArgs;

/// Amount keyword that pays the whole balance.
const PAY_ALL: &str = "all";

pub async fn run(session: &Session, args: &PayArgs) -> Result<()> {
    let token = session.token()?;
    let from = session.settings.payer()?;
    let to = session.parse_address(&args.to).await?;
    if to.is_zero() {
        warn!("destination is the zero address");
    }
    let opts = TransactOpts::new(from);

    let sent = match &token {
        Token::Fungible(erc20) => {
            let decimals = erc20.decimals().await.context("failed to read token decimals")?;
            let symbol = erc20.base().symbol().await.context("failed to read token symbol")?;
            let balance = erc20
                .base()
                .balance_of(&from)
                .await
                .with_context(|| format!("failed to read the balance of {from}"))?;
            let amount = pay_amount(&args.amount, &balance, decimals)?;

            session.unlock(&from).await?;
            info!(%from, %to, amount = %amount, "sending transfer");
            let sent = erc20
                .transfer(&opts, &to, &amount)
                .await
                .context("failed to send the transfer")?;
            println!(
                "Pay {} {symbol} from {from} to {to}",
                raw_to_decimal_string(&amount, decimals)
            );
            sent
        }
        Token::NonFungible(nft) => {
            let token_id = parse_token_id(&args.amount)?;
            let owner = nft
                .owner_of(&token_id)
                .await
                .with_context(|| format!("failed to read the owner of token {token_id}"))?;
            if owner != from {
                println!("Warning: token {token_id} is owned by {owner}, not by {from}");
            }

            session.unlock(&from).await?;
            info!(%from, %to, %token_id, "sending token");
            let sent = nft
                .transfer_from(&opts, &from, &to, &token_id)
                .await
                .context("failed to send the transfer")?;
            println!("Pay token {token_id} from {from} to {to}");
            sent
        }
    };

    session.confirm(&sent, args.nowait).await
}

/// Resolves the typed amount against the payer's balance.
fn pay_amount(text: &str, balance: &RawAmount, decimals: Decimals) -> Result<RawAmount> {
    let amount = if text.eq_ignore_ascii_case(PAY_ALL) {
        balance.clone()
    } else {
        decimal_string_to_raw(text, decimals).with_context(|| format!("invalid pay amount '{text}'"))?
    };
    if amount.is_zero() {
        bail!("pay amount must be greater than zero");
    }
    if &amount > balance {
        bail!(
            "balance is {}, not enough to pay {}",
            raw_to_decimal_string(balance, decimals),
            raw_to_decimal_string(&amount, decimals)
        );
    }
    Ok(amount)
}
