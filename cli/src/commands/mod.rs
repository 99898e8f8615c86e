//! # Commands
//!
//! One module per subcommand. Each `run` prints its results to stdout and
//! returns `anyhow::Result`; the logging layer reports progress on stderr.
//!
//! ```text
//! init.rs       write a default settings file
//! info.rs       token summary, ERC721 token details
//! balance.rs    balances (and owned token ids)
//! pay.rs        single transfer
//! batchpay.rs   plan and execute a batch file
//! mint.rs       ERC721 minting
//! add.rs        save a contract under a symbol
//! convert.rs    hex <-> tagged addresses
//! deploy.rs     create a token contract
//! account.rs    native coin balances
//! ```

pub mod account;
pub mod add;
pub mod balance;
pub mod batchpay;
pub mod convert;
pub mod deploy;
pub mod info;
pub mod init;
pub mod mint;
pub mod pay;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use tokencommander_contracts::{ContractTransport, NodeAccounts, Receipt, SentTransaction, Token};
use tokencommander_protocol::address::{parse_destination, Address, ChainId};
use tokencommander_protocol::amount::{decimal_string_to_raw, render_in_unit, Decimals, RawAmount, Unit, UnitNames};
use tokencommander_protocol::config::{DEFAULT_UNLOCK_ATTEMPTS, TAGGED_ADDRESS_TAG};
use tokencommander_protocol::ledger::{unlock_with_retries, UnlockOutcome};

use crate::prompt::TerminalPrompt;
use crate::rpc::HttpTransport;
use crate::settings::Settings;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Effective settings plus the node connection. Building one does no I/O.
pub struct Session {
    pub settings: Settings,
    pub transport: Arc<HttpTransport>,
}

impl Session {
    pub fn connect(settings: Settings) -> Result<Self> {
        let transport = HttpTransport::new(settings.rpc_url.clone())
            .with_context(|| format!("failed to set up RPC client for {}", settings.rpc_url))?;
        debug!(
            url = transport.url(),
            blockchain = %settings.blockchain,
            mode = %settings.token_kind,
            "session ready"
        );
        Ok(Self {
            settings,
            transport: Arc::new(transport),
        })
    }

    /// The configured contract, typed by the configured mode.
    pub fn token(&self) -> Result<Token<HttpTransport>> {
        let address = self.settings.contract_address()?;
        Ok(Token::new(self.settings.token_kind, address, Arc::clone(&self.transport)))
    }

    pub fn units(&self) -> UnitNames {
        self.settings.blockchain.units()
    }

    pub async fn chain_id(&self) -> Result<ChainId> {
        self.transport.network_id().await.context("failed to get the network id")
    }

    /// Parses an address typed by the operator. Tagged addresses are only
    /// understood on chains that use them, and cost one `net_version` call.
    pub async fn parse_address(&self, text: &str) -> Result<Address> {
        if let Ok(address) = Address::parse_hex(text) {
            return Ok(address);
        }
        let chain_id = if self.settings.blockchain.supports_tagged_addresses() && text.starts_with(TAGGED_ADDRESS_TAG) {
            Some(self.chain_id().await?)
        } else {
            None
        };
        parse_destination(text, chain_id.as_ref()).with_context(|| format!("invalid address '{text}'"))
    }

    /// Unlocks `account` on the node: the configured passphrase first, then
    /// a terminal prompt.
    pub async fn unlock(&self, account: &Address) -> Result<()> {
        let unlocker = NodeAccounts::new(Arc::clone(&self.transport));
        let mut prompt = TerminalPrompt;
        let outcome = unlock_with_retries(
            &unlocker,
            account,
            self.settings.password.as_deref(),
            &mut prompt,
            DEFAULT_UNLOCK_ATTEMPTS,
        )
        .await;

        match outcome {
            UnlockOutcome::Unlocked { .. } => Ok(()),
            UnlockOutcome::Exhausted { attempts, last_error } => Err(anyhow::Error::new(last_error)
                .context(format!("failed to unlock {account} after {attempts} attempts"))),
            UnlockOutcome::PromptFailed(e) => Err(anyhow!(e).context(format!("failed to unlock {account}"))),
        }
    }

    /// Prints the broadcast transaction and, unless `nowait`, waits for its
    /// receipt and prints the fee.
    pub async fn confirm(&self, sent: &SentTransaction, nowait: bool) -> Result<()> {
        println!("Succeed broadcast transaction, TxID {}", sent.tx_id);
        if nowait {
            return Ok(());
        }
        println!("Waiting for the transaction to be mined...");
        let receipt = self
            .transport
            .wait_for_receipt(&sent.tx_id)
            .await
            .with_context(|| format!("failed to get the receipt of {}", sent.tx_id))?;
        println!("{}", receipt_line(self.units(), sent, &receipt));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Shared Helpers
// ---------------------------------------------------------------------------

/// Token ids are non-negative integers.
pub fn parse_token_id(text: &str) -> Result<RawAmount> {
    decimal_string_to_raw(text, Decimals::ZERO).with_context(|| format!("invalid token id '{text}'"))
}

pub fn receipt_line(units: UnitNames, sent: &SentTransaction, receipt: &Receipt) -> String {
    let fee = sent.gas_price.mul_u64(receipt.gas_used);
    let status = if receipt.success { "succeed" } else { "failed" };
    format!(
        "The transaction {} is confirmed and status is {status}, with GasFee({} {}) = GasPrice({} {}) x GasUsed({})",
        receipt.tx_id,
        render_in_unit(&fee, Unit::Major),
        units.major(),
        render_in_unit(&sent.gas_price, Unit::Minor),
        units.minor(),
        receipt.gas_used,
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tokencommander_protocol::config::Blockchain;
    use tokencommander_protocol::ledger::TxId;

    #[test]
    fn token_ids_are_integers() {
        assert_eq!(parse_token_id("42").unwrap(), RawAmount::from(42u64));
        assert!(parse_token_id("1.5").is_err());
        assert!(parse_token_id("all").is_err());
        assert!(parse_token_id("").is_err());
    }

    #[test]
    fn receipt_line_reports_fee_in_major_unit() {
        let tx_id = TxId::from_bytes([0xab; 32]);
        let sent = SentTransaction {
            tx_id,
            gas_price: RawAmount::from(1_000_000_000u64),
            gas_limit: 60_000,
        };
        let receipt = Receipt {
            tx_id,
            gas_used: 21_000,
            success: true,
            contract_address: None,
        };
        let line = receipt_line(Blockchain::NewChain.units(), &sent, &receipt);
        assert!(line.contains("status is succeed"));
        assert!(line.contains("GasFee(0.000021 NEW)"));
        assert!(line.contains("GasPrice(1000000000 ISAAC)"));
        assert!(line.contains("GasUsed(21000)"));
    }
}
