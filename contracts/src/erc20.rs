//! ERC-20 fungible tokens.

use std::sync::Arc;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::{Decimals, RawAmount};

use crate::abi::{decode_u8, CallBuilder};
use crate::token::{BaseToken, ContractError};
use crate::transport::{ContractTransport, SentTransaction, TransactOpts};

pub struct Erc20<T: ?Sized> {
    base: BaseToken<T>,
}

impl<T: ContractTransport + ?Sized> Erc20<T> {
    pub fn new(address: Address, transport: Arc<T>) -> Self {
        Self {
            base: BaseToken::new(address, transport),
        }
    }

    pub fn base(&self) -> &BaseToken<T> {
        &self.base
    }

    /// Fails with `DecimalsOutOfRange` for tokens claiming more than 18.
    pub async fn decimals(&self) -> Result<Decimals, ContractError> {
        let output = self.base.call(CallBuilder::new("decimals()")).await?;
        Ok(Decimals::new(u32::from(decode_u8(&output)?))?)
    }

    pub async fn transfer(
        &self,
        opts: &TransactOpts,
        to: &Address,
        amount: &RawAmount,
    ) -> Result<SentTransaction, ContractError> {
        let call = CallBuilder::new("transfer(address,uint256)").address(to).uint(amount);
        self.base.transact(opts, call).await
    }
}
