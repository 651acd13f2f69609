//! File-backed state stores
//!
//! The production implementations of [`DedupStore`] and [`CursorStore`],
//! matching the persisted layout the engine promises: a line-oriented
//! append-only id file and a small JSON cursor object.

use crate::store::{CrawlCursor, CursorStore, DedupStore, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Append-only dedup store backed by a `processed_ids.txt` file.
///
/// The full id set is held in memory for O(1) membership checks; every
/// `mark_done` appends one line and flushes. A record counts as committed
/// only once its trailing newline is on disk, so an id that was mid-write
/// during a crash is dropped on reload rather than surfacing truncated.
pub struct FileDedupStore {
    file: File,
    seen: HashSet<String>,
}

impl FileDedupStore {
    /// Opens (creating if absent) the id file at `path` and loads the
    /// committed ids.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref();

        let mut seen = HashSet::new();
        let mut has_partial_tail = false;
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let committed = match content.rfind('\n') {
                Some(last_newline) => &content[..last_newline + 1],
                // No newline at all: nothing was ever committed.
                None => "",
            };
            for line in committed.lines() {
                let id = line.trim();
                if !id.is_empty() {
                    seen.insert(id.to_string());
                }
            }
            has_partial_tail = !content.is_empty() && !content.ends_with('\n');
        }

        let mut file = OpenOptions::new().create(true).append(true).open(path)?;

        // Terminate a torn record left by a crash so the next append starts
        // on its own line instead of gluing onto the fragment.
        if has_partial_tail {
            writeln!(file)?;
            file.flush()?;
        }

        Ok(Self { file, seen })
    }
}

impl DedupStore for FileDedupStore {
    fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    fn mark_done(&mut self, id: &str) -> StoreResult<()> {
        if self.seen.contains(id) {
            return Ok(());
        }

        writeln!(self.file, "{}", id)?;
        self.file.flush()?;

        self.seen.insert(id.to_string());
        Ok(())
    }

    fn len(&self) -> usize {
        self.seen.len()
    }
}

/// On-disk shape of the cursor file: `{"last_page": <int>}`.
#[derive(Debug, Serialize, Deserialize)]
struct CursorRecord {
    last_page: u32,
}

/// Cursor store backed by a `crawler_state.json` file.
pub struct FileCursorStore {
    path: PathBuf,
}

impl FileCursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CursorStore for FileCursorStore {
    fn load(&self) -> CrawlCursor {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return CrawlCursor::START,
        };

        match serde_json::from_str::<CursorRecord>(&content) {
            Ok(record) => CrawlCursor::at(record.last_page),
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "cursor state unparseable, restarting from page 1"
                );
                CrawlCursor::START
            }
        }
    }

    fn save(&mut self, cursor: CrawlCursor) -> StoreResult<()> {
        let record = CursorRecord {
            last_page: cursor.page,
        };
        let json = serde_json::to_string(&record)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
