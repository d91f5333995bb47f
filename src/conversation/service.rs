use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::anyhow;

use super::{Completion, TurnError};
use crate::history::{ConversationId, HistoryStore, MessageRecord, Role};
use crate::limiter::RateLimiter;

pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs turns for any number of conversations. Holds no lock while
/// waiting on the completion so conversations don't block each other.
pub struct ConversationService {
    store: Arc<dyn HistoryStore>,
    limiter: Arc<RateLimiter>,
    completion: Arc<dyn Completion>,
    completion_timeout: Duration,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn HistoryStore>,
        limiter: Arc<RateLimiter>,
        completion: Arc<dyn Completion>,
    ) -> Self {
        Self {
            store,
            limiter,
            completion,
            completion_timeout: DEFAULT_COMPLETION_TIMEOUT,
        }
    }

    pub fn completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn store(&self) -> Arc<dyn HistoryStore> {
        Arc::clone(&self.store)
    }

    pub fn limiter(&self) -> Arc<RateLimiter> {
        Arc::clone(&self.limiter)
    }

    /// Run one turn and return the reply.
    pub async fn handle_turn(
        &self,
        conversation_id: &ConversationId,
        user_text: &str,
    ) -> Result<String, TurnError> {
        self.admit(conversation_id)?;
        self.run_admitted_turn(conversation_id, user_text).await
    }

    /// Consume the conversation's cooldown window. Transports call this
    /// before showing a working indicator and then run the turn with
    /// `run_admitted_turn`.
    pub fn admit(&self, conversation_id: &ConversationId) -> Result<(), TurnError> {
        if !self.limiter.try_admit(conversation_id, Instant::now()) {
            tracing::info!("Throttled conversation {}", conversation_id);
            return Err(TurnError::Throttled);
        }
        Ok(())
    }

    /// The rest of a turn once `admit` succeeded.
    ///
    /// The user's message is written before the completion is
    /// requested so it survives a failed or interrupted call and shows
    /// up as context on the next turn.
    pub async fn run_admitted_turn(
        &self,
        conversation_id: &ConversationId,
        user_text: &str,
    ) -> Result<String, TurnError> {
        self.store
            .append(conversation_id, Role::User, user_text)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to store user message for {}: {}", conversation_id, e)
            })?;

        let history = self.history(conversation_id).await?;

        let reply = match tokio::time::timeout(
            self.completion_timeout,
            self.completion.complete(&history),
        )
        .await
        {
            Ok(Ok(reply)) => reply,
            Ok(Err(e)) => {
                tracing::error!(
                    "Completion failed for {}: {}. Root cause: {}",
                    conversation_id,
                    e,
                    e.root_cause()
                );
                return Err(TurnError::CompletionFailed(e));
            }
            Err(_) => {
                tracing::error!(
                    "Completion timed out for {} after {:?}",
                    conversation_id,
                    self.completion_timeout
                );
                return Err(TurnError::CompletionFailed(anyhow!(
                    "Completion timed out after {:?}",
                    self.completion_timeout
                )));
            }
        };

        self.store
            .append(conversation_id, Role::Assistant, &reply)
            .await
            .inspect_err(|e| {
                tracing::error!("Failed to store reply for {}: {}", conversation_id, e)
            })?;

        tracing::debug!(
            "Completed turn for {} with {} message(s) of context",
            conversation_id,
            history.len()
        );

        Ok(reply)
    }

    /// The conversation's retained history, oldest first.
    pub async fn history(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<MessageRecord>, TurnError> {
        let history = self.store.read(conversation_id).await.inspect_err(|e| {
            tracing::error!("Failed to read history for {}: {}", conversation_id, e)
        })?;
        Ok(history)
    }
}
