//! # Token Dispatch
//!
//! Every token shares `name`, `symbol`, `totalSupply` and `balanceOf`
//! through [`BaseToken`]. Anything beyond that belongs to one standard,
//! and [`Token`] refuses to pretend otherwise: asking a fungible token for
//! its owner-of, or a non-fungible one for its decimals, is a
//! [`ContractError::WrongTokenKind`].

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::{AmountError, Decimals, RawAmount};
use tokencommander_protocol::config::TX_ALWAYS_FAILS_MESSAGE;
use tokencommander_protocol::ledger::{is_always_failing, LedgerError};
use tokencommander_protocol::token::TokenKind;

use crate::abi::{decode_string, decode_uint, AbiError, CallBuilder};
use crate::erc20::Erc20;
use crate::erc721::Erc721;
use crate::transport::{ContractTransport, SentTransaction, TransactOpts, TransactionRequest, TransportError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("cannot decode contract output: {0}")]
    Abi(#[from] AbiError),

    /// Gas estimation or submission proved the call can never succeed.
    #[error("{}", TX_ALWAYS_FAILS_MESSAGE)]
    WouldAlwaysFail,

    #[error(transparent)]
    Amount(#[from] AmountError),

    #[error("{capability} is only supported for {expected} tokens, this contract is {actual}")]
    WrongTokenKind {
        capability: &'static str,
        expected: TokenKind,
        actual: TokenKind,
    },
}

impl From<ContractError> for LedgerError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Transport(e) => e.into(),
            ContractError::WouldAlwaysFail => LedgerError::WouldAlwaysFail,
            ContractError::Abi(e) => LedgerError::InvalidResponse(e.to_string()),
            ContractError::Amount(e) => LedgerError::InvalidResponse(e.to_string()),
            e @ ContractError::WrongTokenKind { .. } => LedgerError::Rejected(e.to_string()),
        }
    }
}

/// Promotes the node's always-failing estimate error to its own variant.
fn classify_submission(err: TransportError) -> ContractError {
    match &err {
        TransportError::Rpc { message, .. } if is_always_failing(message) => ContractError::WouldAlwaysFail,
        _ => ContractError::Transport(err),
    }
}

// ---------------------------------------------------------------------------
// BaseToken
// ---------------------------------------------------------------------------

/// A deployed contract plus the transport used to reach it.
pub struct BaseToken<T: ?Sized> {
    address: Address,
    transport: Arc<T>,
}

impl<T: ContractTransport + ?Sized> BaseToken<T> {
    pub fn new(address: Address, transport: Arc<T>) -> Self {
        Self { address, transport }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    pub async fn name(&self) -> Result<String, ContractError> {
        let output = self.call(CallBuilder::new("name()")).await?;
        Ok(decode_string(&output)?)
    }

    pub async fn symbol(&self) -> Result<String, ContractError> {
        let output = self.call(CallBuilder::new("symbol()")).await?;
        Ok(decode_string(&output)?)
    }

    pub async fn total_supply(&self) -> Result<RawAmount, ContractError> {
        let output = self.call(CallBuilder::new("totalSupply()")).await?;
        Ok(decode_uint(&output)?)
    }

    pub async fn balance_of(&self, owner: &Address) -> Result<RawAmount, ContractError> {
        let output = self.call(CallBuilder::new("balanceOf(address)").address(owner)).await?;
        Ok(decode_uint(&output)?)
    }

    pub(crate) async fn call(&self, call: CallBuilder) -> Result<Vec<u8>, ContractError> {
        let data = call.finish()?;
        Ok(self.transport.call(&self.address, data).await?)
    }

    /// Sends a state-changing call, filling gas price and gas limit from
    /// the node when `opts` leaves them unset.
    pub(crate) async fn transact(
        &self,
        opts: &TransactOpts,
        call: CallBuilder,
    ) -> Result<SentTransaction, ContractError> {
        let data = call.finish()?;
        submit(self.transport.as_ref(), opts, Some(self.address), data).await
    }
}

/// Sends `data` to `to`, or creates a contract from it when `to` is `None`.
pub(crate) async fn submit<T: ContractTransport + ?Sized>(
    transport: &T,
    opts: &TransactOpts,
    to: Option<Address>,
    data: Vec<u8>,
) -> Result<SentTransaction, ContractError> {
    let gas_price = match &opts.gas_price {
        Some(price) => price.clone(),
        None => transport.gas_price().await?,
    };
    let gas_limit = match opts.gas_limit {
        Some(limit) => limit,
        None => transport
            .estimate_gas(&opts.from, to.as_ref(), &data)
            .await
            .map_err(classify_submission)?,
    };

    let request = TransactionRequest {
        from: opts.from,
        to,
        data,
        nonce: opts.nonce,
        gas_price: gas_price.clone(),
        gas_limit,
    };
    let tx_id = transport
        .send_transaction(request)
        .await
        .map_err(classify_submission)?;

    debug!(
        to = ?to,
        from = %opts.from,
        nonce = ?opts.nonce,
        %tx_id,
        gas_limit,
        "transaction sent"
    );
    Ok(SentTransaction {
        tx_id,
        gas_price,
        gas_limit,
    })
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// Name, symbol, precision and supply of a token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenSummary {
    pub kind: TokenKind,
    pub address: Address,
    pub name: String,
    pub symbol: String,
    /// `None` for non-fungible tokens.
    pub decimals: Option<Decimals>,
    pub total_supply: RawAmount,
}

/// A token contract of a known standard.
pub enum Token<T: ?Sized> {
    Fungible(Erc20<T>),
    NonFungible(Erc721<T>),
}

impl<T: ContractTransport + ?Sized> Token<T> {
    pub fn new(kind: TokenKind, address: Address, transport: Arc<T>) -> Self {
        match kind {
            TokenKind::Fungible => Token::Fungible(Erc20::new(address, transport)),
            TokenKind::NonFungible => Token::NonFungible(Erc721::new(address, transport)),
        }
    }

    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Fungible(_) => TokenKind::Fungible,
            Token::NonFungible(_) => TokenKind::NonFungible,
        }
    }

    pub fn base(&self) -> &BaseToken<T> {
        match self {
            Token::Fungible(token) => token.base(),
            Token::NonFungible(token) => token.base(),
        }
    }

    pub fn address(&self) -> &Address {
        self.base().address()
    }

    /// The ERC-20 view, or `WrongTokenKind` naming `capability`.
    pub fn as_fungible(&self, capability: &'static str) -> Result<&Erc20<T>, ContractError> {
        match self {
            Token::Fungible(token) => Ok(token),
            Token::NonFungible(_) => Err(self.wrong_kind(capability, TokenKind::Fungible)),
        }
    }

    /// The ERC-721 view, or `WrongTokenKind` naming `capability`.
    pub fn as_non_fungible(&self, capability: &'static str) -> Result<&Erc721<T>, ContractError> {
        match self {
            Token::NonFungible(token) => Ok(token),
            Token::Fungible(_) => Err(self.wrong_kind(capability, TokenKind::NonFungible)),
        }
    }

    fn wrong_kind(&self, capability: &'static str, expected: TokenKind) -> ContractError {
        ContractError::WrongTokenKind {
            capability,
            expected,
            actual: self.kind(),
        }
    }

    pub async fn decimals(&self) -> Result<Decimals, ContractError> {
        self.as_fungible("decimals")?.decimals().await
    }

    pub async fn summary(&self) -> Result<TokenSummary, ContractError> {
        let base = self.base();
        let decimals = match self {
            Token::Fungible(token) => Some(token.decimals().await?),
            Token::NonFungible(_) => None,
        };
        Ok(TokenSummary {
            kind: self.kind(),
            address: *base.address(),
            name: base.name().await?,
            symbol: base.symbol().await?,
            decimals,
            total_supply: base.total_supply().await?,
        })
    }
}
