//! `convert`: hex to tagged and back.

use anyhow::{Context, Result};

use tokencommander_protocol::address::{decode_tagged, encode_tagged, Address, ChainId};

use super::Session;
use crate::cli::ConvertArgs;

pub async fn run(session: &Session, args: &ConvertArgs) -> Result<()> {
    let chain_id = match args.chain_id {
        Some(id) => ChainId::from(id),
        None => session.chain_id().await?,
    };
    println!("{}", convert_address(&args.address, &chain_id)?);
    Ok(())
}

fn convert_address(text: &str, chain_id: &ChainId) -> Result<String> {
    if let Ok(address) = Address::parse_hex(text) {
        return Ok(encode_tagged(chain_id, &address));
    }
    let (_, address) = decode_tagged(text, chain_id)
        .with_context(|| format!("'{text}' is neither a hex nor a tagged address of chain {chain_id}"))?;
    Ok(address.to_checksum_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEX: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[test]
    fn converts_both_ways() {
        let chain = ChainId::from(1012u64);
        let tagged = convert_address(HEX, &chain).unwrap();
        assert!(tagged.starts_with("NEW"));
        assert_eq!(convert_address(&tagged, &chain).unwrap(), HEX);
    }

    #[test]
    fn lowercase_hex_is_accepted() {
        let chain = ChainId::from(1007u64);
        assert_eq!(
            convert_address(&HEX.to_lowercase(), &chain).unwrap(),
            convert_address(HEX, &chain).unwrap()
        );
    }

    #[test]
    fn tagged_address_of_another_chain_is_refused() {
        let tagged = convert_address(HEX, &ChainId::from(1012u64)).unwrap();
        assert!(convert_address(&tagged, &ChainId::from(1007u64)).is_err());
    }

    #[test]
    fn garbage_is_refused() {
        assert!(convert_address("hello", &ChainId::from(1u64)).is_err());
    }
}
