use rusqlite::Connection as SyncConnection;
use tokio_rusqlite::Connection;

pub async fn async_db(db_path: &str) -> Result<Connection, tokio_rusqlite::Error> {
    let db = Connection::open(db_path).await?;
    Ok(db)
}

/// Creates the message table and its indices. Safe to run against an
/// existing database.
pub fn initialize_db(conn: &SyncConnection) -> Result<(), rusqlite::Error> {
    // WAL lets the background purge and request handlers share the
    // file without blocking readers
    let mode: String =
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
    tracing::debug!("SQLite journal mode: {}", mode);

    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS message (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            conversation_id TEXT NOT NULL,
            role TEXT NOT NULL,
            content TEXT NOT NULL,
            -- Microseconds since the unix epoch
            created_at INTEGER NOT NULL
        );
        CREATE INDEX IF NOT EXISTS message_conversation_created_at
            ON message (conversation_id, created_at);
        CREATE INDEX IF NOT EXISTS message_created_at
            ON message (created_at);
        "#,
    )?;

    Ok(())
}
