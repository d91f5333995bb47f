//! Bounded, expiring per-conversation message history.
//!
//! Two rules evict records and both always apply:
//!
//! - Capacity: only the `capacity` most recent records of a
//!   conversation survive an append.
//! - Age: records older than `retention` are deleted across all
//!   conversations by `purge_expired`.
//!
//! `read` runs the age purge before selecting. This is read-triggered
//! garbage collection: every read may delete rows belonging to other
//! conversations. The `PurgeExpiredHistory` job runs the same purge on
//! an interval so the table stays small even when nobody reads.

pub mod db;
pub mod memory;
pub mod models;

pub use db::SqliteHistoryStore;
pub use memory::MemoryHistoryStore;
pub use models::*;

use async_trait::async_trait;

#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Insert a record stamped with the current time then evict all
    /// but the most recent records of the conversation.
    async fn append(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, StoreError>;

    /// Delete every record older than the retention window. Returns
    /// the number of records deleted.
    async fn purge_expired(&self) -> Result<usize, StoreError>;

    /// Purge expired records then return the conversation's retained
    /// records, oldest first.
    async fn read(&self, conversation_id: &ConversationId)
    -> Result<Vec<MessageRecord>, StoreError>;
}
