//! One request/response turn: rate limit, persist, complete, persist.

pub mod error;
pub mod service;

pub use error::TurnError;
pub use service::ConversationService;

use anyhow::{Error, Result};
use async_trait::async_trait;

use crate::history::MessageRecord;

/// Generates the next reply given the conversation so far, oldest
/// message first.
#[async_trait]
pub trait Completion: Send + Sync {
    async fn complete(&self, context: &[MessageRecord]) -> Result<String, Error>;
}
