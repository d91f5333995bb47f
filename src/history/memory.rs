//! In-process history. The server always runs on SQLite, this backing
//! is for tests and embedders that don't need history to survive a
//! restart.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Clock, ConversationId, HistoryPolicy, HistoryStore, MessageRecord, Role, StoreError};

#[derive(Default)]
struct Inner {
    next_seq: i64,
    // Each queue is ordered oldest to newest
    conversations: HashMap<ConversationId, VecDeque<MessageRecord>>,
}

impl Inner {
    fn purge_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let mut purged = 0;
        self.conversations.retain(|_, records| {
            while records.front().is_some_and(|r| r.created_at < cutoff) {
                records.pop_front();
                purged += 1;
            }
            !records.is_empty()
        });
        purged
    }
}

#[derive(Default)]
pub struct MemoryHistoryStore {
    inner: Mutex<Inner>,
    policy: HistoryPolicy,
    clock: Clock,
}

impl MemoryHistoryStore {
    pub fn new(policy: HistoryPolicy) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            policy: HistoryPolicy {
                capacity: policy.capacity.max(1),
                ..policy
            },
            clock: Clock::system(),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, StoreError> {
        let now = self.clock.now();
        let mut inner = self.lock()?;
        inner.next_seq += 1;
        let seq = inner.next_seq;

        let records = inner
            .conversations
            .entry(conversation_id.clone())
            .or_default();
        let created_at = records
            .back()
            .map_or(now, |newest| newest.created_at.max(now));
        let record = MessageRecord {
            seq,
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_owned(),
            created_at,
        };
        records.push_back(record.clone());
        while records.len() > self.policy.capacity {
            records.pop_front();
        }

        Ok(record)
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let cutoff = self.policy.cutoff(self.clock.now());
        Ok(self.lock()?.purge_before(cutoff))
    }

    async fn read(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let cutoff = self.policy.cutoff(self.clock.now());
        let mut inner = self.lock()?;
        let purged = inner.purge_before(cutoff);
        if purged > 0 {
            tracing::debug!("Purged {} expired message(s) on read", purged);
        }

        Ok(inner
            .conversations
            .get(conversation_id)
            .map(|records| records.iter().cloned().collect())
            .unwrap_or_default())
    }
}
