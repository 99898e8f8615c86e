// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TokenCommander
//!
//! Entry point for the `tokencommander` binary. Parses CLI arguments,
//! initializes logging, merges the settings file with flags and environment,
//! and runs one subcommand against the configured node.
//!
//! - `init`      write a default settings file
//! - `version`   print build version information
//! - `info`      token summary
//! - `balance`   token balances
//! - `pay`       single transfer
//! - `batchpay`  batch transfer from a file
//! - `mint`      ERC721 minting
//! - `add`       save a contract under a symbol
//! - `convert`   hex <-> tagged address conversion
//! - `deploy`    create a token contract
//! - `account`   native coin balances

mod cli;
mod commands;
mod logging;
mod prompt;
mod rpc;
mod settings;

use anyhow::Result;
use clap::Parser;

use cli::{AccountCommands, Commands, GlobalArgs, TokenCommanderCli};
use commands::Session;
use settings::{Settings, SettingsFile};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = TokenCommanderCli::parse();
    logging::init_logging(logging::DEFAULT_FILTER, cli.global.log_format);
    let global = cli.global;

    match cli.command {
        Commands::Init(args) => commands::init::run(&global, args.force),
        Commands::Version => {
            print_version();
            Ok(())
        }
        Commands::Info(args) => commands::info::run(&connect(&global)?, args.token_id.as_deref()).await,
        Commands::Balance(args) => commands::balance::run(&connect(&global)?, &args.addresses).await,
        Commands::Pay(args) => commands::pay::run(&connect(&global)?, &args).await,
        Commands::BatchPay(args) => commands::batchpay::run(&connect(&global)?, &args).await,
        Commands::Mint(args) => commands::mint::run(&connect(&global)?, &args).await,
        Commands::Add(args) => {
            let mut file = SettingsFile::load(&global.config)?;
            let session = Session::connect(Settings::resolve(&global, &file)?)?;
            commands::add::run(&session, &mut file, &global.config, &args).await
        }
        Commands::Convert(args) => commands::convert::run(&connect(&global)?, &args).await,
        Commands::Deploy(args) => {
            let mut file = SettingsFile::load(&global.config)?;
            let session = Session::connect(Settings::resolve(&global, &file)?)?;
            commands::deploy::run(&session, &mut file, &global.config, &args).await
        }
        Commands::Account(args) => match args.command {
            AccountCommands::Balance(args) => commands::account::balance(&connect(&global)?, &args).await,
        },
    }
}

fn connect(global: &GlobalArgs) -> Result<Session> {
    let file = SettingsFile::load(&global.config)?;
    Session::connect(Settings::resolve(global, &file)?)
}

/// Prints version information to stdout.
fn print_version() {
    println!("tokencommander {}", env!("CARGO_PKG_VERSION"));
    println!("rustc          {}", option_env!("RUSTC_VERSION").unwrap_or("unknown"));
}
