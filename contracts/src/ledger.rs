//! Adapters from the contract bindings to the protocol's collaborator
//! traits: an ERC-20 contract as a batch [`Ledger`], and node-managed
//! accounts as an [`AccountUnlocker`].

use std::sync::Arc;

use async_trait::async_trait;

use tokencommander_protocol::address::{Address, ChainId};
use tokencommander_protocol::amount::RawAmount;
use tokencommander_protocol::config::UNLOCK_DURATION;
use tokencommander_protocol::ledger::{
    AccountUnlocker, Confirmation, Ledger, LedgerError, SubmittedTransfer, TransferRequest, TxId,
};

use crate::erc20::Erc20;
use crate::transport::{ContractTransport, TransactOpts};

/// An ERC-20 contract seen as the ledger a batch pays through.
pub struct Erc20Ledger<T: ?Sized> {
    token: Erc20<T>,
}

impl<T: ContractTransport + ?Sized> Erc20Ledger<T> {
    pub fn new(token: Erc20<T>) -> Self {
        Self { token }
    }

    pub fn token(&self) -> &Erc20<T> {
        &self.token
    }

    fn transport(&self) -> &Arc<T> {
        self.token.base().transport()
    }
}

#[async_trait]
impl<T: ContractTransport + ?Sized> Ledger for Erc20Ledger<T> {
    async fn balance_of(&self, owner: &Address) -> Result<RawAmount, LedgerError> {
        Ok(self.token.base().balance_of(owner).await?)
    }

    async fn pending_nonce(&self, account: &Address) -> Result<u64, LedgerError> {
        Ok(self.transport().pending_nonce(account).await?)
    }

    async fn network_chain_id(&self) -> Result<ChainId, LedgerError> {
        Ok(self.transport().network_id().await?)
    }

    async fn suggest_gas_price(&self) -> Result<RawAmount, LedgerError> {
        Ok(self.transport().gas_price().await?)
    }

    async fn transfer(&self, request: TransferRequest) -> Result<SubmittedTransfer, LedgerError> {
        let opts = TransactOpts {
            from: request.from,
            nonce: Some(request.nonce),
            gas_price: Some(request.gas_price),
            gas_limit: None,
        };
        let sent = self.token.transfer(&opts, &request.to, &request.amount).await?;
        Ok(SubmittedTransfer {
            tx_id: sent.tx_id,
            gas_limit: sent.gas_limit,
        })
    }

    async fn wait_confirmed(&self, tx_id: &TxId) -> Result<Confirmation, LedgerError> {
        let receipt = self.transport().wait_for_receipt(tx_id).await?;
        Ok(Confirmation {
            gas_used: receipt.gas_used,
            success: receipt.success,
        })
    }
}

/// Accounts whose keys the node holds, unlocked via the node itself.
pub struct NodeAccounts<T: ?Sized> {
    transport: Arc<T>,
}

impl<T: ContractTransport + ?Sized> NodeAccounts<T> {
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl<T: ContractTransport + ?Sized> AccountUnlocker for NodeAccounts<T> {
    async fn unlock(&self, account: &Address, passphrase: &str) -> Result<(), LedgerError> {
        match self.transport.unlock_account(account, passphrase, UNLOCK_DURATION).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(LedgerError::Locked {
                account: *account,
                reason: "the node refused the passphrase".into(),
            }),
            Err(e) => Err(LedgerError::Locked {
                account: *account,
                reason: e.to_string(),
            }),
        }
    }
}
