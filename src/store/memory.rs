//! In-memory state stores for tests and dry runs

use crate::store::{CrawlCursor, CursorStore, DedupStore, StoreResult};
use std::collections::HashSet;

/// Volatile dedup store. Same semantics as the file store, minus durability.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    seen: HashSet<String>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for MemoryDedupStore {
    fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    fn mark_done(&mut self, id: &str) -> StoreResult<()> {
        self.seen.insert(id.to_string());
        Ok(())
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

/// Volatile cursor store.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursor: Option<CrawlCursor>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last saved cursor, if any save happened.
    pub fn saved(&self) -> Option<CrawlCursor> {
        self.cursor
    }
}

impl CursorStore for MemoryCursorStore {
    fn load(&self) -> CrawlCursor {
        self.cursor.unwrap_or_default()
    }

    fn save(&mut self, cursor: CrawlCursor) -> StoreResult<()> {
        self.cursor = Some(cursor);
        Ok(())
    }
}
