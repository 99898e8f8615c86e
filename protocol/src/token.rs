//! # Token Standards
//!
//! TokenCommander speaks exactly two token standards. Rather than probing a
//! contract handle at runtime to find out what it is, every token carries a
//! [`TokenKind`] tag and callers dispatch on it. Adding a third standard
//! means adding a variant and letting the compiler point at every `match`
//! that needs to learn about it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a mode string names no known standard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("not support mode {0}, only support ERC20|ERC721")]
pub struct UnknownTokenKind(pub String);

/// The closed set of token standards.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    /// ERC-20: divisible balances with a `decimals` display scale.
    #[default]
    #[serde(rename = "ERC20")]
    Fungible,

    /// ERC-721: every unit is a distinct token id.
    #[serde(rename = "ERC721")]
    NonFungible,
}

impl TokenKind {
    /// Every kind, in display order.
    pub const ALL: [TokenKind; 2] = [TokenKind::Fungible, TokenKind::NonFungible];

    /// The standard's conventional name.
    pub fn standard(&self) -> &'static str {
        match self {
            TokenKind::Fungible => "ERC20",
            TokenKind::NonFungible => "ERC721",
        }
    }

    /// Batch payments split an amount across recipients, which only makes
    /// sense for divisible tokens.
    pub fn supports_batch_pay(&self) -> bool {
        matches!(self, TokenKind::Fungible)
    }

    /// Minting is exposed only for non-fungible contracts.
    pub fn supports_mint(&self) -> bool {
        matches!(self, TokenKind::NonFungible)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.standard())
    }
}

impl FromStr for TokenKind {
    type Err = UnknownTokenKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().replace('-', "").as_str() {
            "ERC20" => Ok(TokenKind::Fungible),
            "ERC721" => Ok(TokenKind::NonFungible),
            _ => Err(UnknownTokenKind(s.to_string())),
        }
    }
}
