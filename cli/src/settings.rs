//! # Settings
//!
//! The on-disk settings file and its merge with the command line.
//!
//! Precedence, highest first: command line flag, `TOKENCOMMANDER_*`
//! environment variable (both handled by clap), settings file, built-in
//! default. A missing settings file is not an error.
//!
//! ```toml
//! walletPath = "./wallet/"
//! rpcURL = "https://rpc1.newchain.newtonproject.org"
//! contractAddress = "0x..."
//! from = "0x..."
//! mode = "ERC20"
//! blockchain = "NewChain"
//!
//! [Contracts]
//! NUSD = "0x..."
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::config::{Blockchain, CommanderConfig, ContractAdded, ContractBook};
use tokencommander_protocol::token::TokenKind;

use crate::cli::GlobalArgs;

/// Written by `init`. Kept so files shared with keystore-based tools stay
/// intact when `add` rewrites them.
pub const DEFAULT_WALLET_PATH: &str = "./wallet/";

// ---------------------------------------------------------------------------
// SettingsFile
// ---------------------------------------------------------------------------

/// The settings file as stored. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsFile {
    #[serde(rename = "walletPath", default, skip_serializing_if = "Option::is_none")]
    pub wallet_path: Option<String>,

    #[serde(rename = "rpcURL", default, skip_serializing_if = "Option::is_none")]
    pub rpc_url: Option<String>,

    #[serde(rename = "contractAddress", default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,

    #[serde(alias = "Password", default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blockchain: Option<String>,

    /// Symbol → contract address, as saved by `add`.
    #[serde(rename = "Contracts", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub contracts: BTreeMap<String, String>,
}

impl SettingsFile {
    /// What `init` writes.
    pub fn defaults(blockchain: Blockchain) -> Self {
        Self {
            wallet_path: Some(DEFAULT_WALLET_PATH.to_string()),
            rpc_url: Some(blockchain.default_rpc_url().to_string()),
            mode: Some(TokenKind::Fungible.to_string()),
            blockchain: Some(blockchain.to_string()),
            ..Self::default()
        }
    }

    /// Loads `path`, or returns an empty file when it does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "settings file not found, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read settings file {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse settings file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = toml::to_string_pretty(self).context("failed to serialize settings")?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        fs::write(path, text).with_context(|| format!("failed to write settings file {}", path.display()))
    }

    pub fn contract_book(&self) -> Result<ContractBook> {
        let mut book = ContractBook::new();
        for (symbol, address) in &self.contracts {
            let address: Address = address
                .parse()
                .with_context(|| format!("invalid address saved for symbol {symbol}"))?;
            book.insert(symbol, address)?;
        }
        Ok(book)
    }

    /// Registers `symbol` for `address` in the `[Contracts]` table.
    pub fn add_contract(&mut self, symbol: &str, address: Address) -> Result<ContractAdded> {
        let added = self.contract_book()?.insert(symbol, address)?;
        if added == ContractAdded::Added {
            self.contracts.insert(symbol.to_string(), address.to_string());
        }
        Ok(added)
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Effective settings after merging flags, environment and file.
#[derive(Debug, Clone)]
pub struct Settings {
    pub rpc_url: String,
    pub blockchain: Blockchain,
    pub token_kind: TokenKind,
    pub contract: Option<Address>,
    pub symbol: Option<String>,
    pub from: Option<Address>,
    pub password: Option<String>,
    pub contracts: ContractBook,
}

impl Settings {
    pub fn resolve(args: &GlobalArgs, file: &SettingsFile) -> Result<Self> {
        let blockchain = match args.blockchain.as_deref().or(file.blockchain.as_deref()) {
            Some(name) => name.parse()?,
            None => Blockchain::default(),
        };
        let token_kind = match args.mode.as_deref().or(file.mode.as_deref()) {
            Some(mode) => mode.parse()?,
            None => TokenKind::default(),
        };
        let rpc_url = args
            .rpc_url
            .clone()
            .or_else(|| file.rpc_url.clone())
            .unwrap_or_else(|| blockchain.default_rpc_url().to_string());
        let contract = parse_optional_address(
            args.contract_address.as_deref().or(file.contract_address.as_deref()),
            "contract address",
        )?;
        let from = parse_optional_address(args.from.as_deref().or(file.from.as_deref()), "from address")?;

        Ok(Self {
            rpc_url,
            blockchain,
            token_kind,
            contract,
            symbol: args.symbol.clone(),
            from,
            password: args.password.clone().or_else(|| file.password.clone()),
            contracts: file.contract_book()?,
        })
    }

    pub fn commander_config(&self) -> CommanderConfig {
        CommanderConfig {
            blockchain: self.blockchain,
            token_kind: self.token_kind,
            contract: self.contract,
            contracts: self.contracts.clone(),
        }
    }

    /// The contract selected by `--symbol`, or the default one.
    pub fn contract_address(&self) -> Result<Address> {
        Ok(self.commander_config().resolve_contract(self.symbol.as_deref())?)
    }

    pub fn payer(&self) -> Result<Address> {
        self.from
            .ok_or_else(|| anyhow!("the from address is not set, pass --from or set `from` in the settings file"))
    }
}

fn parse_optional_address(text: Option<&str>, what: &str) -> Result<Option<Address>> {
    text.filter(|t| !t.is_empty())
        .map(|t| t.parse::<Address>().with_context(|| format!("invalid {what} '{t}'")))
        .transpose()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
