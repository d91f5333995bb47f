//! SQLite backed history. Every operation runs as a single
//! `tokio_rusqlite` call wrapped in a transaction so it is applied
//! completely or not at all.

use async_trait::async_trait;
use chrono::DateTime;
use rusqlite::params;
use tokio_rusqlite::Connection;

use super::{Clock, ConversationId, HistoryPolicy, HistoryStore, MessageRecord, Role, StoreError};

pub struct SqliteHistoryStore {
    db: Connection,
    policy: HistoryPolicy,
    clock: Clock,
}

impl SqliteHistoryStore {
    /// Expects the schema from `core::db::initialize_db` to exist.
    pub fn new(db: Connection, policy: HistoryPolicy) -> Self {
        Self {
            db,
            policy: HistoryPolicy {
                // A capacity of zero would evict the record that was
                // just written
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

    /// Capacity as an SQL `LIMIT`. A negative limit means no limit in
    /// SQLite so huge capacities saturate instead of wrapping.
    fn capacity_limit(&self) -> i64 {
        i64::try_from(self.policy.capacity).unwrap_or(i64::MAX)
    }

    fn cutoff_micros(&self) -> i64 {
        self.policy.cutoff(self.clock.now()).timestamp_micros()
    }
}

fn purge_before(conn: &rusqlite::Connection, cutoff: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM message WHERE created_at < ?1", [cutoff])
}

fn to_datetime(micros: i64) -> Result<DateTime<chrono::Utc>, StoreError> {
    DateTime::from_timestamp_micros(micros).ok_or(StoreError::InvalidTimestamp(micros))
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn append(
        &self,
        conversation_id: &ConversationId,
        role: Role,
        content: &str,
    ) -> Result<MessageRecord, StoreError> {
        let id = conversation_id.as_str().to_owned();
        let data = content.to_owned();
        let now = self.clock.now().timestamp_micros();
        let capacity = self.capacity_limit();

        let (seq, created_at, evicted) = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;

                // Never stamp a record earlier than the newest one in
                // the conversation, even if the wall clock went back
                let newest: Option<i64> = tx.query_row(
                    "SELECT MAX(created_at) FROM message WHERE conversation_id = ?1",
                    [&id],
                    |row| row.get(0),
                )?;
                let created_at = newest.map_or(now, |newest| newest.max(now));

                tx.execute(
                    "INSERT INTO message (conversation_id, role, content, created_at) VALUES (?1, ?2, ?3, ?4)",
                    params![id, role, data, created_at],
                )?;
                let seq = tx.last_insert_rowid();

                let evicted = tx.execute(
                    r#"
                    DELETE FROM message
                    WHERE conversation_id = ?1
                    AND id NOT IN (
                        SELECT id FROM message
                        WHERE conversation_id = ?1
                        ORDER BY created_at DESC, id DESC
                        LIMIT ?2
                    )
                    "#,
                    params![id, capacity],
                )?;

                tx.commit()?;
                Ok((seq, created_at, evicted))
            })
            .await?;

        if evicted > 0 {
            tracing::debug!(
                "Evicted {} message(s) over capacity from conversation {}",
                evicted,
                conversation_id
            );
        }

        Ok(MessageRecord {
            seq,
            conversation_id: conversation_id.clone(),
            role,
            content: content.to_owned(),
            created_at: to_datetime(created_at)?,
        })
    }

    async fn purge_expired(&self) -> Result<usize, StoreError> {
        let cutoff = self.cutoff_micros();
        let purged = self
            .db
            .call(move |conn| Ok(purge_before(conn, cutoff)?))
            .await?;
        Ok(purged)
    }

    async fn read(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<MessageRecord>, StoreError> {
        let id = conversation_id.as_str().to_owned();
        let cutoff = self.cutoff_micros();
        let capacity = self.capacity_limit();

        let (purged, rows) = self
            .db
            .call(move |conn| {
                let tx = conn.transaction()?;
                let purged = purge_before(&tx, cutoff)?;
                let rows = {
                    let mut stmt = tx.prepare(
                        r#"
                        SELECT id, role, content, created_at FROM message
                        WHERE conversation_id = ?1 AND created_at >= ?2
                        ORDER BY created_at DESC, id DESC
                        LIMIT ?3
                        "#,
                    )?;
                    stmt.query_map(params![id, cutoff, capacity], |row| {
                        Ok((
                            row.get::<_, i64>(0)?,
                            row.get::<_, Role>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, i64>(3)?,
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?
                };
                tx.commit()?;
                Ok((purged, rows))
            })
            .await?;

        if purged > 0 {
            tracing::debug!("Purged {} expired message(s) on read", purged);
        }

        // Selected newest first so the limit keeps the most recent
        rows.into_iter()
            .rev()
            .map(|(seq, role, content, created_at)| {
                Ok(MessageRecord {
                    seq,
                    conversation_id: conversation_id.clone(),
                    role,
                    content,
                    created_at: to_datetime(created_at)?,
                })
            })
            .collect()
    }
}
