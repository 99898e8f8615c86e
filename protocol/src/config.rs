//! # Configuration & Constants
//!
//! Every magic number in TokenCommander lives here, next to the explicit
//! configuration objects that get handed to planners and executors. There
//! is no process-wide settings store: whoever constructs a component passes
//! it the configuration it needs, and persisting that configuration is the
//! command line's problem.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::Address;
use crate::amount::units::UnitNames;
use crate::token::TokenKind;

// ---------------------------------------------------------------------------
// Address Encoding
// ---------------------------------------------------------------------------

/// Length of a raw ledger address in bytes.
pub const ADDRESS_LENGTH: usize = 20;

/// Literal prefix of every chain-tagged address.
pub const TAGGED_ADDRESS_TAG: &str = "NEW";

/// Base58-check version byte used for tagged addresses.
pub const TAGGED_ADDRESS_VERSION: u8 = 0;

// ---------------------------------------------------------------------------
// Amounts
// ---------------------------------------------------------------------------

/// Largest `decimals` value a token may declare.
pub const MAX_DECIMALS: u8 = 18;

/// Decimal places of the major native unit (ETH, NEW). Also the boundary
/// at which balance summaries switch from the minor to the major unit.
pub const MAJOR_UNIT_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Ledger Interaction
// ---------------------------------------------------------------------------

/// How many times an account unlock is attempted before giving up. The
/// first attempt uses the configured passphrase, the second one prompts.
pub const DEFAULT_UNLOCK_ATTEMPTS: u32 = 2;

/// How long an unlocked node account stays unlocked.
pub const UNLOCK_DURATION: Duration = Duration::from_secs(300);

/// Upper bound on waiting for a single transaction to be mined.
pub const CONFIRMATION_TIMEOUT: Duration = Duration::from_secs(180);

/// Interval between receipt polls while waiting for confirmation.
pub const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Error fragments the ledger emits when gas estimation proves that a
/// transaction can never succeed (bad parameters, missing allowance, ...).
pub const ALWAYS_FAILING_SIGNATURES: [&str; 2] = [
    "gas required exceeds allowance",
    "always failing transaction",
];

/// Operator-facing replacement for the always-failing signature.
pub const TX_ALWAYS_FAILS_MESSAGE: &str =
    "This is a transaction that will always fail. Please check contract and parameters again.";

// ---------------------------------------------------------------------------
// Networks
// ---------------------------------------------------------------------------

/// Default JSON-RPC endpoint for Ethereum mode.
pub const DEFAULT_ETHEREUM_RPC_URL: &str = "https://ethrpc.service.newtonproject.org";

/// Default JSON-RPC endpoint for NewChain mode.
pub const DEFAULT_NEWCHAIN_RPC_URL: &str = "https://rpc1.newchain.newtonproject.org";

/// The ledger family the tool is pointed at.
///
/// Both speak the same JSON-RPC dialect. NewChain additionally accepts
/// chain-tagged `NEW…` addresses and names its units differently.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Blockchain {
    Ethereum,
    #[default]
    NewChain,
}

impl Blockchain {
    /// Unit names used when rendering native amounts (gas, balances).
    pub fn units(&self) -> UnitNames {
        match self {
            Blockchain::Ethereum => UnitNames::new("ETH", "WEI"),
            Blockchain::NewChain => UnitNames::new("NEW", "ISAAC"),
        }
    }

    /// Whether destinations may be written in the chain-tagged form.
    pub fn supports_tagged_addresses(&self) -> bool {
        matches!(self, Blockchain::NewChain)
    }

    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Blockchain::Ethereum => DEFAULT_ETHEREUM_RPC_URL,
            Blockchain::NewChain => DEFAULT_NEWCHAIN_RPC_URL,
        }
    }
}

impl fmt::Display for Blockchain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Blockchain::Ethereum => write!(f, "Ethereum"),
            Blockchain::NewChain => write!(f, "NewChain"),
        }
    }
}

impl FromStr for Blockchain {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Blockchain::Ethereum),
            "newchain" | "new" => Ok(Blockchain::NewChain),
            _ => Err(ConfigError::UnknownBlockchain(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while assembling or querying configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unknown blockchain '{0}', expected Ethereum|NewChain")]
    UnknownBlockchain(String),

    #[error("contract address of symbol {0} not set")]
    UnknownSymbol(String),

    #[error("symbol {symbol} is already used by contract {existing}, please choose a new symbol")]
    SymbolTaken { symbol: String, existing: Address },

    #[error("symbol must not be empty")]
    EmptySymbol,

    #[error("contract address is not set")]
    NoContract,
}

// ---------------------------------------------------------------------------
// ContractBook
// ---------------------------------------------------------------------------

/// Result of registering a symbol in a [`ContractBook`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractAdded {
    Added,
    /// The same symbol already pointed at the same contract.
    AlreadyPresent,
}

/// Symbol → contract address lookup, replacing ad-hoc global settings.
///
/// Symbols are matched exactly; `nUSD` and `NUSD` are different tokens.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractBook {
    contracts: BTreeMap<String, Address>,
}

impl ContractBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `symbol` for `address`.
    ///
    /// Re-adding the same pair is a no-op. Pointing an existing symbol at a
    /// different contract is refused.
    pub fn insert(&mut self, symbol: &str, address: Address) -> Result<ContractAdded, ConfigError> {
        if symbol.is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        match self.contracts.get(symbol) {
            Some(existing) if *existing == address => Ok(ContractAdded::AlreadyPresent),
            Some(existing) => Err(ConfigError::SymbolTaken {
                symbol: symbol.to_string(),
                existing: *existing,
            }),
            None => {
                self.contracts.insert(symbol.to_string(), address);
                Ok(ContractAdded::Added)
            }
        }
    }

    pub fn resolve(&self, symbol: &str) -> Result<Address, ConfigError> {
        self.contracts
            .get(symbol)
            .copied()
            .ok_or_else(|| ConfigError::UnknownSymbol(symbol.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Address)> {
        self.contracts.iter().map(|(s, a)| (s.as_str(), a))
    }

    pub fn len(&self) -> usize {
        self.contracts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contracts.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CommanderConfig
// ---------------------------------------------------------------------------

/// Everything the core needs to know about where it is pointed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommanderConfig {
    pub blockchain: Blockchain,
    pub token_kind: TokenKind,
    /// Contract used when no symbol is given.
    pub contract: Option<Address>,
    pub contracts: ContractBook,
}

impl CommanderConfig {
    /// Picks the contract to talk to. A symbol, when given, wins over the
    /// default contract address.
    pub fn resolve_contract(&self, symbol: Option<&str>) -> Result<Address, ConfigError> {
        match symbol {
            Some(symbol) => self.contracts.resolve(symbol),
            None => self.contract.ok_or(ConfigError::NoContract),
        }
    }
}
