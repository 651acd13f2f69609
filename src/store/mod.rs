//! Durable session state: dedup records and the crawl cursor
//!
//! Each harvest target owns two small state files living inside its output
//! directory:
//! - `processed_ids.txt`: append-only set of completed item identifiers,
//!   one per line.
//! - `crawler_state.json`: the pagination cursor, a single JSON object.
//!
//! Both are modelled behind traits so the engine can be exercised with
//! in-memory fakes.

mod file;
mod memory;

pub use file::{FileCursorStore, FileDedupStore};
pub use memory::{MemoryCursorStore, MemoryDedupStore};

use thiserror::Error;

/// Errors that can occur while reading or writing session state
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Durable pointer to pagination progress.
///
/// Persisted once per fully processed listing page, never mid-page, so a
/// crash replays at most one page of discovery. Replayed items are shielded
/// by the dedup store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlCursor {
    /// 1-based listing page number.
    pub page: u32,
}

impl CrawlCursor {
    /// The cursor a fresh (or corrupt-state) session starts from.
    pub const START: CrawlCursor = CrawlCursor { page: 1 };

    pub fn at(page: u32) -> Self {
        Self { page: page.max(1) }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
        }
    }
}

impl Default for CrawlCursor {
    fn default() -> Self {
        Self::START
    }
}

/// Durable record of item identifiers already completed.
///
/// Append-only: once an id is present it is present forever. `mark_done`
/// must be crash-safe — a partially written record never corrupts
/// previously committed ones.
pub trait DedupStore {
    /// Membership test. Checked before any network fetch for an item.
    fn contains(&self, id: &str) -> bool;

    /// Durably records an id as completed. Idempotent.
    fn mark_done(&mut self, id: &str) -> StoreResult<()>;

    /// Number of recorded ids.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Durable pagination cursor storage.
pub trait CursorStore {
    /// Loads the persisted cursor. Missing or unparseable state degrades to
    /// [`CrawlCursor::START`], never to a failure.
    fn load(&self) -> CrawlCursor;

    /// Persists the cursor.
    fn save(&mut self, cursor: CrawlCursor) -> StoreResult<()>;
}
