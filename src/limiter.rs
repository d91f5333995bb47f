//! Per-conversation cooldown gate.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::history::ConversationId;

pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(3);

/// Admits at most one request per conversation per `cooldown`. State
/// lives in memory only and is lost on restart.
pub struct RateLimiter {
    cooldown: Duration,
    last_admitted: Mutex<HashMap<ConversationId, Instant>>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl RateLimiter {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last_admitted: Mutex::new(HashMap::new()),
        }
    }

    /// Returns `true` and records `now` when the conversation's last
    /// admitted request is at least `cooldown` old.
    pub fn try_admit(&self, conversation_id: &ConversationId, now: Instant) -> bool {
        // The check and the update happen under the same lock so two
        // racing calls can't both be admitted in one window. A
        // poisoned map only holds instants so it's safe to keep using.
        let mut last_admitted = self
            .last_admitted
            .lock()
            .unwrap_or_else(|e| e.into_inner());

        if let Some(last) = last_admitted.get(conversation_id)
            && now.saturating_duration_since(*last) < self.cooldown
        {
            return false;
        }

        last_admitted.insert(conversation_id.clone(), now);
        true
    }

    /// Forget conversations whose cooldown has elapsed. Returns the
    /// number of entries removed.
    pub fn prune(&self, now: Instant) -> usize {
        let mut last_admitted = self
            .last_admitted
            .lock()
            .unwrap_or_else(|e| e.into_inner());
        let before = last_admitted.len();
        last_admitted.retain(|_, last| now.saturating_duration_since(*last) < self.cooldown);
        before - last_admitted.len()
    }

    pub fn len(&self) -> usize {
        self.last_admitted
            .lock()
            .map(|m| m.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
