//! Bounded unlock of a node-managed account.
//!
//! The first attempt uses whatever passphrase the operator configured.
//! Every further attempt asks the prompt for a fresh one.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use super::LedgerError;
use crate::address::Address;

/// Something that can unlock an account with a passphrase.
#[async_trait]
pub trait AccountUnlocker: Send + Sync {
    async fn unlock(&self, account: &Address, passphrase: &str) -> Result<(), LedgerError>;
}

/// The prompt could not produce a passphrase (closed terminal, ...).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("passphrase prompt failed: {0}")]
pub struct PromptError(pub String);

/// Source of passphrases after the configured one was refused.
pub trait PassphrasePrompt {
    /// `attempt` is 1-based and counts every unlock attempt so far,
    /// including the one about to be made.
    fn prompt(&mut self, account: &Address, attempt: u32) -> Result<String, PromptError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked { attempts: u32 },
    Exhausted { attempts: u32, last_error: LedgerError },
    PromptFailed(PromptError),
}

impl UnlockOutcome {
    pub fn is_unlocked(&self) -> bool {
        matches!(self, UnlockOutcome::Unlocked { .. })
    }
}

/// Tries to unlock `account` at most `max_attempts` times (at least once).
///
/// Without a configured passphrase the very first attempt already prompts.
pub async fn unlock_with_retries<U, P>(
    unlocker: &U,
    account: &Address,
    configured: Option<&str>,
    prompt: &mut P,
    max_attempts: u32,
) -> UnlockOutcome
where
    U: AccountUnlocker + ?Sized,
    P: PassphrasePrompt + ?Sized,
{
    let max_attempts = max_attempts.max(1);
    let mut last_error = None;

    for attempt in 1..=max_attempts {
        let passphrase = match (attempt, configured) {
            (1, Some(passphrase)) => passphrase.to_string(),
            _ => match prompt.prompt(account, attempt) {
                Ok(passphrase) => passphrase,
                Err(e) => return UnlockOutcome::PromptFailed(e),
            },
        };

        match unlocker.unlock(account, &passphrase).await {
            Ok(()) => {
                debug!(%account, attempt, "account unlocked");
                return UnlockOutcome::Unlocked { attempts: attempt };
            }
            Err(e) => {
                warn!(%account, attempt, error = %e, "account unlock failed");
                last_error = Some(e);
            }
        }
    }

    UnlockOutcome::Exhausted {
        attempts: max_attempts,
        last_error: last_error.unwrap_or_else(|| LedgerError::Locked {
            account: *account,
            reason: "no unlock attempt was made".into(),
        }),
    }
}
