//! SQLite sink
//!
//! Stores documents in a single `documents` table keyed by item id.
//! Re-storing an id replaces the row, so a replayed item after a crash
//! between sink write and mark-done stays consistent.

use crate::sink::{DocumentSink, NormalizedDocument, SinkResult};
use chrono::Utc;
use rusqlite::{params, Connection};
use std::path::Path;

/// SQLite-backed document sink
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    pub fn open(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        Self::initialize(conn)
    }

    /// Creates an in-memory sink (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> SinkResult<Self> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> SinkResult<Self> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS documents (
                id             TEXT PRIMARY KEY,
                url            TEXT NOT NULL,
                title          TEXT NOT NULL,
                published_date TEXT NOT NULL,
                body           TEXT NOT NULL,
                stored_at      TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self { conn })
    }

    /// Number of stored documents.
    pub fn document_count(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl DocumentSink for SqliteSink {
    fn store(&mut self, doc: &NormalizedDocument) -> SinkResult<()> {
        let now = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO documents (id, url, title, published_date, body, stored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![doc.id, doc.url, doc.title, doc.published_date, doc.body, now],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_doc(id: &str) -> NormalizedDocument {
        NormalizedDocument {
            id: id.to_string(),
            url: format!("https://example.com/{}", id),
            title: format!("Title {}", id),
            published_date: "2024-01-15".to_string(),
            body: "Body.".to_string(),
        }
    }

    #[test]
    fn test_store_and_count() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.store(&test_doc("a")).unwrap();
        sink.store(&test_doc("b")).unwrap();

        assert_eq!(sink.document_count().unwrap(), 2);
    }

    #[test]
    fn test_restore_same_id_replaces_row() {
        let mut sink = SqliteSink::open_in_memory().unwrap();
        sink.store(&test_doc("a")).unwrap();

        let mut updated = test_doc("a");
        updated.title = "Updated".to_string();
        sink.store(&updated).unwrap();

        assert_eq!(sink.document_count().unwrap(), 1);
        let title: String = sink
            .conn
            .query_row("SELECT title FROM documents WHERE id = 'a'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(title, "Updated");
    }
}
