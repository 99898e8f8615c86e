//! Passphrase entry on the controlling terminal.

use tokencommander_protocol::address::Address;
use tokencommander_protocol::ledger::{PassphrasePrompt, PromptError};

/// Reads a passphrase without echo via `rpassword`.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl PassphrasePrompt for TerminalPrompt {
    fn prompt(&mut self, account: &Address, attempt: u32) -> Result<String, PromptError> {
        let message = if attempt <= 1 {
            format!("Enter passphrase of {account}: ")
        } else {
            format!("Wrong passphrase, enter passphrase of {account} again: ")
        };
        rpassword::prompt_password(message).map_err(|e| PromptError(e.to_string()))
    }
}
