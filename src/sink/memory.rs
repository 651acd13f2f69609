//! In-memory sink for engine tests

use crate::sink::{DocumentSink, NormalizedDocument, SinkError, SinkResult};

/// Sink collecting documents in memory, with optional simulated failure
#[derive(Debug, Default)]
pub struct MemorySink {
    docs: Vec<NormalizedDocument>,
    failing: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// When set, every `store` call fails without recording the document.
    pub fn set_failing(&mut self, failing: bool) {
        self.failing = failing;
    }

    pub fn stored(&self) -> usize {
        self.docs.len()
    }

    pub fn docs(&self) -> &[NormalizedDocument] {
        &self.docs
    }
}

impl DocumentSink for MemorySink {
    fn store(&mut self, doc: &NormalizedDocument) -> SinkResult<()> {
        if self.failing {
            return Err(SinkError::Rejected("simulated sink failure".to_string()));
        }
        self.docs.push(doc.clone());
        Ok(())
    }
}
