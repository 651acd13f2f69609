//! Document sinks
//!
//! A sink durably stores one normalized document. A failed store is
//! surfaced to the processor, which then leaves the item unmarked so it is
//! retried on the next run.

mod memory;
mod sqlite;
mod text;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;
pub use text::TextFileSink;

use crate::config::SinkKind;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur while storing documents
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink rejected document: {0}")]
    Rejected(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// A document after normalization: the unit a sink durably stores
#[derive(Debug, Clone)]
pub struct NormalizedDocument {
    /// Stable item identifier, shared with the dedup store.
    pub id: String,
    pub url: String,
    pub title: String,
    pub published_date: String,
    pub body: String,
}

/// Durable storage collaborator for finished documents
pub trait DocumentSink {
    fn store(&mut self, doc: &NormalizedDocument) -> SinkResult<()>;
}

impl DocumentSink for Box<dyn DocumentSink + Send> {
    fn store(&mut self, doc: &NormalizedDocument) -> SinkResult<()> {
        (**self).store(doc)
    }
}

/// Opens the configured sink for a target's output directory.
pub fn open_sink(
    kind: SinkKind,
    output_dir: &Path,
) -> SinkResult<Box<dyn DocumentSink + Send>> {
    match kind {
        SinkKind::Text => Ok(Box::new(TextFileSink::new(output_dir)?)),
        SinkKind::Sqlite => Ok(Box::new(SqliteSink::open(&output_dir.join("documents.db"))?)),
    }
}
