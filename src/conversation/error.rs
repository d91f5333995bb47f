use thiserror::Error;

use crate::history::StoreError;

pub const THROTTLED_MESSAGE: &str = "You're sending messages too quickly. Please wait a moment.";
pub const APOLOGY_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Every way a turn can fail. All of them end the current turn only.
#[derive(Debug, Error)]
pub enum TurnError {
    /// The conversation is still cooling down. Nothing was written.
    #[error("conversation is rate limited")]
    Throttled,
    /// Reading or writing history failed. Writes may not have happened.
    #[error("history storage unavailable: {0}")]
    StorageUnavailable(#[source] StoreError),
    /// The completion call failed or timed out. The user's message is
    /// stored but no reply was.
    #[error("completion failed: {0}")]
    CompletionFailed(#[source] anyhow::Error),
}

impl TurnError {
    /// Text to show the user in place of a reply.
    pub fn user_message(&self) -> &'static str {
        match self {
            TurnError::Throttled => THROTTLED_MESSAGE,
            TurnError::StorageUnavailable(_) | TurnError::CompletionFailed(_) => APOLOGY_MESSAGE,
        }
    }
}

impl From<StoreError> for TurnError {
    fn from(err: StoreError) -> Self {
        TurnError::StorageUnavailable(err)
    }
}
