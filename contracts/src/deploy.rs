//! Contract deployment.
//!
//! Creation data is the compiled token bytecode followed by its ABI-encoded
//! constructor arguments:
//!
//! ```text
//! ERC20   constructor(string name, string symbol, uint8 decimals, uint256 totalSupply)
//! ERC721  constructor(string name, string symbol)
//! ```

use tokencommander_protocol::amount::{Decimals, RawAmount};
use tokencommander_protocol::token::TokenKind;

use crate::abi::CallBuilder;
use crate::token::{submit, ContractError};
use crate::transport::{ContractTransport, SentTransaction, TransactOpts};

/// Constructor arguments of a token contract.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    /// Ignored for ERC721.
    pub decimals: Decimals,
    /// Raw units. Ignored for ERC721.
    pub total_supply: RawAmount,
}

/// Bytecode plus the constructor arguments `kind` expects.
pub fn creation_data(kind: TokenKind, bytecode: Vec<u8>, params: &TokenParams) -> Result<Vec<u8>, ContractError> {
    let call = CallBuilder::creation(bytecode)
        .string(&params.name)
        .string(&params.symbol);
    let call = match kind {
        TokenKind::Fungible => call.uint8(params.decimals.get()).uint(&params.total_supply),
        TokenKind::NonFungible => call,
    };
    Ok(call.finish()?)
}

/// Broadcasts a contract creation. The new address is in the receipt.
pub async fn deploy<T: ContractTransport + ?Sized>(
    transport: &T,
    opts: &TransactOpts,
    kind: TokenKind,
    bytecode: Vec<u8>,
    params: &TokenParams,
) -> Result<SentTransaction, ContractError> {
    let data = creation_data(kind, bytecode, params)?;
    submit(transport, opts, None, data).await
}
