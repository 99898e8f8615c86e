// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # TokenCommander Protocol
//!
//! The part of TokenCommander that actually has to be right. Everything the
//! command line does with money flows through here: turning `"12.5"` into
//! `12500000` raw units (and back) without rounding, telling a hex address
//! from a chain-tagged one, and walking a batch of payments through the
//! ledger one nonce at a time.
//!
//! ## Architecture
//!
//! - **amount**: Fixed-point codec between decimal text and raw units.
//! - **address**: Plain hex addresses and the chain-tagged `NEW…` form.
//! - **batch**: Batch file planning and sequential execution.
//! - **ledger**: The collaborator traits the executor talks to, plus the
//!   bounded account unlock loop.
//! - **token**: The closed set of token standards we speak.
//! - **config**: Constants and the explicit configuration objects.
//!
//! ## Ground Rules
//!
//! 1. Amounts are arbitrary-precision integers. Floats never touch them.
//! 2. Nothing in this crate does I/O on its own. The ledger is injected.
//! 3. A batch is either valid as a whole or rejected as a whole.

pub mod address;
pub mod amount;
pub mod batch;
pub mod config;
pub mod ledger;
pub mod token;
