//! Text-file sink
//!
//! One `.txt` file per document with a small metadata header block followed
//! by the cleaned body. Filenames derive from the document title.

use crate::sink::{DocumentSink, NormalizedDocument, SinkResult};
use std::path::{Path, PathBuf};

/// Sink writing one text file per document into an output directory
pub struct TextFileSink {
    dir: PathBuf,
}

impl TextFileSink {
    pub fn new(dir: impl AsRef<Path>) -> SinkResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn file_path(&self, doc: &NormalizedDocument) -> PathBuf {
        let mut name = sanitize_filename(&doc.title);
        if name.is_empty() {
            name = sanitize_filename(&doc.id);
        }
        self.dir.join(format!("{}.txt", name))
    }
}

impl DocumentSink for TextFileSink {
    fn store(&mut self, doc: &NormalizedDocument) -> SinkResult<()> {
        let path = self.file_path(doc);

        let content = format!(
            "Title: {}\nDate: {}\nURL: {}\n{}\n\n{}",
            doc.title,
            doc.published_date,
            doc.url,
            "-".repeat(40),
            doc.body
        );

        std::fs::write(&path, content)?;
        tracing::debug!(path = %path.display(), "document written");
        Ok(())
    }
}

/// Makes a string safe for use as a filename: filesystem-special characters
/// become underscores, surrounding whitespace and dots are trimmed, and the
/// result is capped at 200 characters.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|' => '_',
            other => other,
        })
        .collect();

    replaced
        .trim()
        .trim_matches('.')
        .chars()
        .take(200)
        .collect()
}
