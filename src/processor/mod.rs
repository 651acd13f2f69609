//! Item processor
//!
//! Handles one discovered item end to end: dedup check before any network
//! cost, politeness delay, bounded detail fetch with a single retry,
//! extraction with fallbacks, normalization, sink write, and only then the
//! done-mark. One item failing never aborts the batch.

use crate::config::{EngineConfig, TargetConfig};
use crate::extract::{extract_document, ExtractionRules};
use crate::fetch::{FetchOutcome, PageFetcher};
use crate::normalize::{clean_content, CleanRules};
use crate::sink::{DocumentSink, NormalizedDocument};
use crate::store::DedupStore;
use crate::walker::WorkItem;
use crate::Result;
use rand::Rng;
use std::time::Duration;

/// What happened to one item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemOutcome {
    /// Fetched, normalized, durably stored, and marked done.
    Stored,

    /// Already in the dedup store; no fetch was made.
    Duplicate,

    /// Fetch or sink failed; logged and left for the next run (unless
    /// `mark-failed-done` is set).
    Skipped,
}

/// Processes discovered items for one target
pub struct ItemProcessor<'a, F> {
    target: &'a TargetConfig,
    engine: &'a EngineConfig,
    fetcher: &'a F,
    extraction: ExtractionRules,
    clean_rules: CleanRules,
}

impl<'a, F: PageFetcher> ItemProcessor<'a, F> {
    pub fn new(
        target: &'a TargetConfig,
        engine: &'a EngineConfig,
        fetcher: &'a F,
    ) -> Result<Self> {
        let extraction = ExtractionRules::compile(target)?;

        let clean_rules = CleanRules {
            stop_markers: target.stop_markers.clone(),
            marker_line_max_len: target.marker_line_max_len,
            header_end_marker: target.header_end_marker.clone(),
            header_scan_lines: target.header_scan_lines,
        };

        Ok(Self {
            target,
            engine,
            fetcher,
            extraction,
            clean_rules,
        })
    }

    /// Runs one item through the pipeline. Infallible from the batch's
    /// point of view: failures are logged and reported in the outcome.
    pub async fn process(
        &self,
        item: &WorkItem,
        dedup: &mut impl DedupStore,
        sink: &mut impl DocumentSink,
    ) -> ItemOutcome {
        // Membership first: a done item must never cost a fetch.
        if dedup.contains(&item.id) {
            tracing::debug!(target_name = %self.target.name, id = %item.id, "already processed, skipping");
            return ItemOutcome::Duplicate;
        }

        self.politeness_delay().await;

        let body = match self.fetch_with_retry(&item.url).await {
            FetchOutcome::Success { body, .. } => body,
            FetchOutcome::Transient { error } | FetchOutcome::Fatal { error } => {
                tracing::warn!(
                    target_name = %self.target.name,
                    url = %item.url,
                    %error,
                    "item fetch failed, continuing with next item"
                );
                self.mark_failed_if_configured(item, dedup);
                return ItemOutcome::Skipped;
            }
        };

        let extracted = extract_document(&body, &item.url, &self.extraction);
        let cleaned = clean_content(&extracted.body, &self.clean_rules);

        let doc = NormalizedDocument {
            id: item.id.clone(),
            url: extracted.url,
            title: extracted.title,
            published_date: extracted.published_date,
            body: cleaned,
        };

        match sink.store(&doc) {
            Ok(()) => {
                // Mark-done strictly after the sink write: a crash in
                // between replays the item, never loses it.
                if let Err(e) = dedup.mark_done(&item.id) {
                    tracing::error!(
                        target_name = %self.target.name,
                        id = %item.id,
                        error = %e,
                        "stored but failed to record done-mark, item will be retried"
                    );
                }
                tracing::info!(target_name = %self.target.name, title = %doc.title, "document stored");
                ItemOutcome::Stored
            }
            Err(e) => {
                tracing::warn!(
                    target_name = %self.target.name,
                    id = %item.id,
                    error = %e,
                    "sink write failed, item left unmarked"
                );
                self.mark_failed_if_configured(item, dedup);
                ItemOutcome::Skipped
            }
        }
    }

    fn mark_failed_if_configured(&self, item: &WorkItem, dedup: &mut impl DedupStore) {
        if !self.engine.mark_failed_done {
            return;
        }
        if let Err(e) = dedup.mark_done(&item.id) {
            tracing::error!(
                target_name = %self.target.name,
                id = %item.id,
                error = %e,
                "failed to record done-mark for failed item"
            );
        }
    }

    /// Jittered delay between items. A rate-limiting contract with the
    /// source, not an optimization knob.
    async fn politeness_delay(&self) {
        let wait_ms = {
            let mut rng = rand::thread_rng();
            rng.gen_range(self.engine.item_delay_min_ms..=self.engine.item_delay_max_ms)
        };
        if wait_ms > 0 {
            tracing::trace!(wait_ms, "politeness delay");
            tokio::time::sleep(Duration::from_millis(wait_ms)).await;
        }
    }

    async fn fetch_with_retry(&self, url: &str) -> FetchOutcome {
        let timeout = Duration::from_secs(self.engine.detail_timeout_secs);

        let first = self.fetcher.fetch(url, timeout).await;
        if !first.is_transient() {
            return first;
        }

        tokio::time::sleep(Duration::from_millis(self.engine.retry_backoff_ms)).await;
        self.fetcher.fetch(url, timeout).await
    }
}
