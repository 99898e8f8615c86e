//! # TokenCommander Contracts
//!
//! Typed bindings for the two token standards TokenCommander drives:
//!
//! - **ERC-20**: fungible balances, `decimals`, `transfer`.
//! - **ERC-721**: ownership, token URIs, minting, `transferFrom`.
//!
//! The bindings speak to a node through [`transport::ContractTransport`]
//! and never see JSON or HTTP. [`ledger`] adapts them to the protocol
//! crate's `Ledger` and `AccountUnlocker` traits so the batch executor can
//! run against a real contract. The `deploy` module creates new token contracts
//! from compiled bytecode.
//!
//! ## Design Principles
//!
//! 1. Every amount and token id is a `RawAmount`. Values wider than
//!    `uint256` are rejected during encoding.
//! 2. Calls against the wrong standard fail with a typed error instead of
//!    reverting on chain.
//! 3. An estimate that says "this will always fail" is surfaced as such.

pub mod abi;
pub mod deploy;
pub mod erc20;
pub mod erc721;
pub mod ledger;
pub mod token;
pub mod transport;

pub use deploy::{creation_data, deploy, TokenParams};
pub use erc20::Erc20;
pub use erc721::Erc721;
pub use ledger::{Erc20Ledger, NodeAccounts};
pub use token::{BaseToken, ContractError, Token, TokenSummary};
pub use transport::{ContractTransport, Receipt, SentTransaction, TransactOpts, TransactionRequest, TransportError};
