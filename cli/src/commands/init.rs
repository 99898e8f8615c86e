//! `init`: write a default settings file.

use anyhow::{bail, Result};

use tokencommander_protocol::config::Blockchain;

use crate::cli::GlobalArgs;
use crate::settings::SettingsFile;

/// Connection flags given alongside `init` end up in the new file.
pub fn run(args: &GlobalArgs, force: bool) -> Result<()> {
    let path = &args.config;
    if path.exists() && !force {
        bail!("settings file {} already exists, pass --force to overwrite it", path.display());
    }

    let file = initial_settings(args)?;
    file.save(path)?;
    println!("Initialize settings file {}", path.display());
    Ok(())
}

fn initial_settings(args: &GlobalArgs) -> Result<SettingsFile> {
    let blockchain = match args.blockchain.as_deref() {
        Some(name) => name.parse::<Blockchain>()?,
        None => Blockchain::default(),
    };
    let mut file = SettingsFile::defaults(blockchain);
    if let Some(url) = &args.rpc_url {
        file.rpc_url = Some(url.clone());
    }
    if let Some(mode) = &args.mode {
        file.mode = Some(mode.clone());
    }
    file.contract_address = args.contract_address.clone();
    file.from = args.from.clone();
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogFormat;
    use std::path::Path;
    use tokencommander_protocol::config::DEFAULT_ETHEREUM_RPC_URL;

    fn args(config: &Path) -> GlobalArgs {
        GlobalArgs {
            config: config.to_path_buf(),
            rpc_url: None,
            contract_address: None,
            from: None,
            mode: None,
            symbol: None,
            blockchain: None,
            password: None,
            log_format: LogFormat::Pretty,
        }
    }

    #[test]
    fn writes_defaults_for_the_requested_chain() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut args = args(&path);
        args.blockchain = Some("Ethereum".into());
        args.from = Some("0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359".into());

        run(&args, false).unwrap();

        let file = SettingsFile::load(&path).unwrap();
        assert_eq!(file.rpc_url.as_deref(), Some(DEFAULT_ETHEREUM_RPC_URL));
        assert_eq!(file.blockchain.as_deref(), Some("Ethereum"));
        assert_eq!(file.mode.as_deref(), Some("ERC20"));
        assert_eq!(file.from, args.from);
        assert!(file.password.is_none());
    }

    #[test]
    fn refuses_to_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "rpcURL = \"http://keep.me\"\n").unwrap();

        assert!(run(&args(&path), false).is_err());
        assert_eq!(
            SettingsFile::load(&path).unwrap().rpc_url.as_deref(),
            Some("http://keep.me")
        );

        run(&args(&path), true).unwrap();
        assert_ne!(
            SettingsFile::load(&path).unwrap().rpc_url.as_deref(),
            Some("http://keep.me")
        );
    }

    #[test]
    fn unknown_blockchain_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut args = args(&dir.path().join("config.toml"));
        args.blockchain = Some("Bitcoin".into());
        assert!(run(&args, false).is_err());
    }
}
