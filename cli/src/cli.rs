//! # CLI Interface
//!
//! Command-line structure for `tokencommander`, defined with `clap` derive.
//! Connection flags are global so they can be given before or after the
//! subcommand, and each one can also come from a `TOKENCOMMANDER_*`
//! environment variable.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Command line client for ERC-20 and ERC-721 token contracts.
///
/// Talks to an Ethereum or NewChain node over JSON-RPC. Transactions are
/// signed by the node, using accounts it manages.
#[derive(Parser, Debug)]
#[command(
    name = "tokencommander",
    about = "Command line client for ERC20 / ERC721 token contracts",
    version,
    propagate_version = true
)]
pub struct TokenCommanderCli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Path to the settings file (TOML).
    #[arg(
        long,
        short = 'c',
        global = true,
        env = "TOKENCOMMANDER_CONFIG",
        default_value = "./config.toml"
    )]
    pub config: PathBuf,

    /// JSON-RPC endpoint of the node.
    #[arg(long, short = 'i', global = true, env = "TOKENCOMMANDER_RPC_URL")]
    pub rpc_url: Option<String>,

    /// Default token contract address.
    #[arg(long, short = 'a', global = true, env = "TOKENCOMMANDER_CONTRACT_ADDRESS")]
    pub contract_address: Option<String>,

    /// Account that pays and signs.
    #[arg(long, short = 'f', global = true, env = "TOKENCOMMANDER_FROM")]
    pub from: Option<String>,

    /// Token standard of the contract: ERC20 or ERC721.
    #[arg(long, global = true, env = "TOKENCOMMANDER_MODE")]
    pub mode: Option<String>,

    /// Symbol of a contract saved with `add`. Takes precedence over
    /// `--contract-address`.
    #[arg(long, short = 's', global = true)]
    pub symbol: Option<String>,

    /// Ledger family: Ethereum or NewChain.
    #[arg(long, global = true, env = "TOKENCOMMANDER_BLOCKCHAIN")]
    pub blockchain: Option<String>,

    /// Passphrase of the `from` account on the node.
    #[arg(long, global = true, env = "TOKENCOMMANDER_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Log output format.
    #[arg(
        long,
        global = true,
        value_enum,
        env = "TOKENCOMMANDER_LOG_FORMAT",
        default_value_t = LogFormat::Pretty
    )]
    pub log_format: LogFormat,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default settings file.
    Init(InitArgs),
    /// Print version information and exit.
    Version,
    /// Show name, symbol, decimals and total supply of the contract.
    Info(InfoArgs),
    /// Show the token balance of one or more addresses.
    Balance(BalanceArgs),
    /// Pay tokens (ERC20) or a token id (ERC721) to one address.
    Pay(PayArgs),
    /// Pay ERC20 tokens to every address listed in a batch file.
    #[command(name = "batchpay")]
    BatchPay(BatchPayArgs),
    /// Mint an ERC721 token.
    Mint(MintArgs),
    /// Save a contract address under a symbol.
    Add(AddArgs),
    /// Convert an address between the hex and the NewChain tagged forms.
    Convert(ConvertArgs),
    /// Deploy a token contract. The symbol is taken from `--symbol`.
    Deploy(DeployArgs),
    /// Native coin accounts.
    Account(AccountArgs),
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing settings file.
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// ERC721 only: show owner and URI of this token id.
    pub token_id: Option<String>,
}

#[derive(Args, Debug)]
pub struct BalanceArgs {
    /// Addresses to query. Defaults to the `from` account.
    pub addresses: Vec<String>,
}

#[derive(Args, Debug)]
pub struct PayArgs {
    /// Amount in token units, `all` for the whole balance, or the token id
    /// for ERC721.
    pub amount: String,

    /// Destination address.
    #[arg(long, short = 't')]
    pub to: String,

    /// Return right after broadcasting instead of waiting for the receipt.
    #[arg(long)]
    pub nowait: bool,
}

#[derive(Args, Debug)]
pub struct BatchPayArgs {
    /// Batch file with one `address,amount` pair per line.
    pub file: PathBuf,

    /// Gas price in the minor unit. Asked from the node when omitted.
    #[arg(long, short = 'p')]
    pub price: Option<u64>,

    /// Nonce of the first transaction. Asked from the node when omitted.
    #[arg(long, short = 'n')]
    pub nonce: Option<u64>,

    /// Wait for every transaction to be mined before sending the next.
    #[arg(long)]
    pub wait: bool,
}

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Address receiving the new token.
    pub address: String,

    /// Token id to mint. Defaults to the current total supply.
    pub token_id: Option<String>,

    /// Token URI, minted with `mintWithTokenURI`.
    #[arg(long)]
    pub uri: Option<String>,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Contract address.
    pub contract: String,

    /// Symbol to save it under. Read from the contract when omitted.
    pub symbol: Option<String>,
}

#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Address in hex or tagged form.
    pub address: String,

    /// Chain id to encode with or check against. Asked from the node when
    /// omitted.
    #[arg(long)]
    pub chain_id: Option<u64>,
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    /// Token name.
    #[arg(long, short = 'n')]
    pub name: String,

    /// ERC20 only: total supply in token units.
    #[arg(long, short = 't', default_value = "0")]
    pub total: String,

    /// ERC20 only: number of decimals.
    #[arg(long, short = 'd', default_value_t = 18)]
    pub decimals: u8,

    /// File with the compiled contract bytecode, in hex.
    #[arg(long, env = "TOKENCOMMANDER_BYTECODE")]
    pub bytecode: PathBuf,

    /// Save the new address as the default contract even if one is set.
    #[arg(long)]
    pub save: bool,
}

#[derive(Args, Debug)]
pub struct AccountArgs {
    #[command(subcommand)]
    pub command: AccountCommands,
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Show the native coin balance of one or more addresses.
    Balance(AccountBalanceArgs),
}

#[derive(Args, Debug)]
pub struct AccountBalanceArgs {
    /// Unit to show balances in: the major or the minor unit name of the
    /// chain (NEW / ISAAC, ETH / WEI). Picked per balance when omitted.
    #[arg(long, short = 'u')]
    pub unit: Option<String>,

    /// Also print the account count and the summed balance. Always on when
    /// more than one address is queried.
    #[arg(long)]
    pub sum: bool,

    /// Addresses to query. Defaults to the node's accounts, or the `from`
    /// account when the node has none.
    pub addresses: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        TokenCommanderCli::command().debug_assert();
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = TokenCommanderCli::try_parse_from([
            "tokencommander",
            "balance",
            "-s",
            "NUSD",
            "--blockchain",
            "Ethereum",
            "0x00000000000000000000000000000000000000aa",
        ])
        .unwrap();
        assert_eq!(cli.global.symbol.as_deref(), Some("NUSD"));
        assert_eq!(cli.global.blockchain.as_deref(), Some("Ethereum"));
        match cli.command {
            Commands::Balance(args) => assert_eq!(args.addresses.len(), 1),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn batchpay_flags() {
        let cli = TokenCommanderCli::try_parse_from([
            "tokencommander",
            "batchpay",
            "pay.txt",
            "-p",
            "1000",
            "-n",
            "7",
            "--wait",
        ])
        .unwrap();
        match cli.command {
            Commands::BatchPay(args) => {
                assert_eq!(args.file, PathBuf::from("pay.txt"));
                assert_eq!(args.price, Some(1000));
                assert_eq!(args.nonce, Some(7));
                assert!(args.wait);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn deploy_flags() {
        let cli = TokenCommanderCli::try_parse_from([
            "tokencommander",
            "deploy",
            "-s",
            "NUSD",
            "-n",
            "Newton USD",
            "-t",
            "1000000",
            "-d",
            "6",
            "--bytecode",
            "erc20.bin",
        ])
        .unwrap();
        assert_eq!(cli.global.symbol.as_deref(), Some("NUSD"));
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.name, "Newton USD");
                assert_eq!(args.total, "1000000");
                assert_eq!(args.decimals, 6);
                assert_eq!(args.bytecode, PathBuf::from("erc20.bin"));
                assert!(!args.save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn deploy_decimals_default_to_eighteen() {
        let cli = TokenCommanderCli::try_parse_from([
            "tokencommander",
            "deploy",
            "-n",
            "Newton USD",
            "--bytecode",
            "erc20.bin",
            "--save",
        ])
        .unwrap();
        match cli.command {
            Commands::Deploy(args) => {
                assert_eq!(args.decimals, 18);
                assert!(args.save);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn account_balance_takes_a_unit() {
        let cli = TokenCommanderCli::try_parse_from([
            "tokencommander",
            "account",
            "balance",
            "-u",
            "WEI",
            "--sum",
            "0x00000000000000000000000000000000000000aa",
            "0x00000000000000000000000000000000000000bb",
        ])
        .unwrap();
        match cli.command {
            Commands::Account(AccountArgs {
                command: AccountCommands::Balance(args),
            }) => {
                assert_eq!(args.unit.as_deref(), Some("WEI"));
                assert!(args.sum);
                assert_eq!(args.addresses.len(), 2);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn pay_requires_destination() {
        let err = TokenCommanderCli::try_parse_from(["tokencommander", "pay", "10"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
