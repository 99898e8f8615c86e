//! ERC-721 non-fungible tokens, including the mintable and enumerable
//! extensions (`mint`, `mintWithTokenURI`, `isMinter`, `tokensOfOwner`).

use std::sync::Arc;

use tokencommander_protocol::address::Address;
use tokencommander_protocol::amount::RawAmount;

use crate::abi::{decode_address, decode_bool, decode_string, decode_uint_array, CallBuilder};
use crate::token::{BaseToken, ContractError};
use crate::transport::{ContractTransport, SentTransaction, TransactOpts};

pub struct Erc721<T: ?Sized> {
    base: BaseToken<T>,
}

impl<T: ContractTransport + ?Sized> Erc721<T> {
    pub fn new(address: Address, transport: Arc<T>) -> Self {
        Self {
            base: BaseToken::new(address, transport),
        }
    }

    pub fn base(&self) -> &BaseToken<T> {
        &self.base
    }

    pub async fn owner_of(&self, token_id: &RawAmount) -> Result<Address, ContractError> {
        let output = self.base.call(CallBuilder::new("ownerOf(uint256)").uint(token_id)).await?;
        Ok(decode_address(&output)?)
    }

    pub async fn exists(&self, token_id: &RawAmount) -> Result<bool, ContractError> {
        let output = self.base.call(CallBuilder::new("exists(uint256)").uint(token_id)).await?;
        Ok(decode_bool(&output)?)
    }

    pub async fn token_uri(&self, token_id: &RawAmount) -> Result<String, ContractError> {
        let output = self.base.call(CallBuilder::new("tokenURI(uint256)").uint(token_id)).await?;
        Ok(decode_string(&output)?)
    }

    pub async fn is_minter(&self, account: &Address) -> Result<bool, ContractError> {
        let output = self.base.call(CallBuilder::new("isMinter(address)").address(account)).await?;
        Ok(decode_bool(&output)?)
    }

    pub async fn tokens_of_owner(&self, owner: &Address) -> Result<Vec<RawAmount>, ContractError> {
        let output = self
            .base
            .call(CallBuilder::new("tokensOfOwner(address)").address(owner))
            .await?;
        Ok(decode_uint_array(&output)?)
    }

    pub async fn transfer_from(
        &self,
        opts: &TransactOpts,
        from: &Address,
        to: &Address,
        token_id: &RawAmount,
    ) -> Result<SentTransaction, ContractError> {
        let call = CallBuilder::new("transferFrom(address,address,uint256)")
            .address(from)
            .address(to)
            .uint(token_id);
        self.base.transact(opts, call).await
    }

    pub async fn mint(
        &self,
        opts: &TransactOpts,
        to: &Address,
        token_id: &RawAmount,
    ) -> Result<SentTransaction, ContractError> {
        let call = CallBuilder::new("mint(address,uint256)").address(to).uint(token_id);
        self.base.transact(opts, call).await
    }

    pub async fn mint_with_token_uri(
        &self,
        opts: &TransactOpts,
        to: &Address,
        token_id: &RawAmount,
        uri: &str,
    ) -> Result<SentTransaction, ContractError> {
        let call = CallBuilder::new("mintWithTokenURI(address,uint256,string)")
            .address(to)
            .uint(token_id)
            .string(uri);
        self.base.transact(opts, call).await
    }
}
