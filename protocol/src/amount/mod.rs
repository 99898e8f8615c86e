//! # Amount Module: Fixed-Point Precision
//!
//! Ledgers count in raw units: the smallest indivisible quantity of a token.
//! Humans count in decimals. This module is the only place the two meet.
//!
//! ```text
//! codec.rs   RawAmount, Decimals, decimal text <-> raw units
//! units.rs   native unit names and the balance-summary renderer
//! ```
//!
//! ## Design Principles
//!
//! 1. **Raw amounts are unbounded.** `RawAmount` wraps a `BigUint`, so a
//!    sum of balances can never overflow, no matter how many tokens a
//!    contract decided to mint.
//!
//! 2. **Parsing never rounds.** A fraction with more digits than the token
//!    has decimals is an error, not a suggestion.
//!
//! 3. **Decimals belong to the token.** The same raw amount renders as
//!    `1.5` under 2 decimals and `0.00015` under 6.

pub mod codec;
pub mod units;

pub use codec::{decimal_string_to_raw, raw_to_decimal_string, AmountError, Decimals, RawAmount};
pub use units::{render_in_unit, render_with_unit_auto_select, Unit, UnitNames};
