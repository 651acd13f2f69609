//! Run statistics
//!
//! Per-session counters reported once per listing page and at run end.
//! Nothing silently disappears: skipped pages and items are counted and
//! logged with their cause where they happen.

use crate::processor::ItemOutcome;

/// Counters for one harvest session (one target, one run)
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionStats {
    /// Listing pages fetched and scanned.
    pub pages_visited: u32,

    /// Listing pages skipped after a failed retry.
    pub pages_skipped: u32,

    /// Items discovered across all visited pages (including duplicates).
    pub items_discovered: u64,

    /// Items already present in the dedup store.
    pub items_duplicate: u64,

    /// Items fetched, normalized, stored, and marked done.
    pub items_stored: u64,

    /// Items whose fetch or sink write failed.
    pub items_skipped: u64,
}

impl SessionStats {
    pub fn record_item(&mut self, outcome: ItemOutcome) {
        match outcome {
            ItemOutcome::Stored => self.items_stored += 1,
            ItemOutcome::Duplicate => self.items_duplicate += 1,
            ItemOutcome::Skipped => self.items_skipped += 1,
        }
    }

    /// Folds another session's counters into this one (for cross-target
    /// totals).
    pub fn merge(&mut self, other: &SessionStats) {
        self.pages_visited += other.pages_visited;
        self.pages_skipped += other.pages_skipped;
        self.items_discovered += other.items_discovered;
        self.items_duplicate += other.items_duplicate;
        self.items_stored += other.items_stored;
        self.items_skipped += other.items_skipped;
    }

    pub fn log_summary(&self, target: &str) {
        tracing::info!(
            target_name = %target,
            pages_visited = self.pages_visited,
            pages_skipped = self.pages_skipped,
            items_discovered = self.items_discovered,
            items_stored = self.items_stored,
            items_duplicate = self.items_duplicate,
            items_skipped = self.items_skipped,
            "harvest session complete"
        );
    }
}
