//! Harvest engine
//!
//! Orchestrates one session per target: the listing walker drives
//! pagination, the item processor drains each discovered batch, and the
//! cursor store is updated once per page so an interrupted run resumes
//! where it left off. Independent targets run as parallel tasks; within a
//! target everything is strictly sequential.

mod stats;

pub use stats::SessionStats;

use crate::config::{Config, EngineConfig, TargetConfig};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::processor::ItemProcessor;
use crate::sink::{open_sink, DocumentSink};
use crate::store::{CrawlCursor, CursorStore, DedupStore, FileCursorStore, FileDedupStore};
use crate::walker::{ListingPage, ListingWalker};
use crate::{ConfigError, GleanError, Result};
use std::path::Path;
use tokio::task::JoinSet;

/// Runs one harvest session for a target against the given collaborators.
///
/// Generic over the fetch, store, and sink seams so the full loop can be
/// driven by in-memory fakes in tests.
pub async fn run_session<F, D, C, S>(
    target: &TargetConfig,
    engine: &EngineConfig,
    fetcher: &F,
    dedup: &mut D,
    cursors: &mut C,
    sink: &mut S,
    fresh: bool,
) -> Result<SessionStats>
where
    F: PageFetcher,
    D: DedupStore,
    C: CursorStore,
    S: DocumentSink,
{
    let walker = ListingWalker::new(target, engine, fetcher)?;
    let processor = ItemProcessor::new(target, engine, fetcher)?;
    let mut stats = SessionStats::default();

    let mut cursor = if fresh {
        CrawlCursor::START
    } else {
        cursors.load()
    };

    tracing::info!(
        target_name = %target.name,
        page = cursor.page,
        known_items = dedup.len(),
        "starting harvest session"
    );

    loop {
        if cursor.page > engine.max_pages {
            tracing::info!(
                target_name = %target.name,
                max_pages = engine.max_pages,
                "maximum page bound reached, ending walk"
            );
            break;
        }

        let page = walker
            .next_page(cursor, stats.pages_visited)
            .await?;

        match page {
            ListingPage::Skipped => {
                stats.pages_skipped += 1;
                save_cursor(cursors, cursor, &target.name);
                cursor = cursor.next();
            }

            ListingPage::Fetched { items, has_more } => {
                stats.pages_visited += 1;
                stats.items_discovered += items.len() as u64;

                // Cursor commits after discovery, before item processing:
                // a crash mid-page replays at most this page, and the
                // dedup store makes the replay idempotent.
                save_cursor(cursors, cursor, &target.name);

                if items.is_empty() && !has_more {
                    tracing::info!(
                        target_name = %target.name,
                        page = cursor.page,
                        "no items and no next page, walk complete"
                    );
                    break;
                }

                let mut page_stats = SessionStats::default();
                for item in &items {
                    let outcome = processor.process(item, dedup, sink).await;
                    page_stats.record_item(outcome);
                }

                tracing::info!(
                    target_name = %target.name,
                    page = cursor.page,
                    found = items.len(),
                    stored = page_stats.items_stored,
                    duplicate = page_stats.items_duplicate,
                    skipped = page_stats.items_skipped,
                    "listing page processed"
                );
                stats.merge(&page_stats);

                if !has_more {
                    tracing::info!(
                        target_name = %target.name,
                        page = cursor.page,
                        "no next page detected, walk complete"
                    );
                    break;
                }

                cursor = cursor.next();
            }
        }
    }

    stats.log_summary(&target.name);
    Ok(stats)
}

/// Cursor persistence is best-effort: a failed write means the next run
/// resumes at most one page early, which item-level dedup absorbs.
fn save_cursor(cursors: &mut impl CursorStore, cursor: CrawlCursor, target: &str) {
    if let Err(e) = cursors.save(cursor) {
        tracing::warn!(
            target_name = %target,
            page = cursor.page,
            error = %e,
            "failed to persist crawl cursor, next run may replay this page"
        );
    }
}

/// Runs all (or one filtered) configured targets, each as its own task
/// with its own state files. Returns aggregate statistics.
pub async fn run_targets(
    config: Config,
    fresh: bool,
    only: Option<String>,
) -> Result<SessionStats> {
    let targets: Vec<TargetConfig> = match &only {
        Some(name) => {
            let filtered: Vec<_> = config
                .targets
                .iter()
                .filter(|t| &t.name == name)
                .cloned()
                .collect();
            if filtered.is_empty() {
                return Err(GleanError::Config(ConfigError::Validation(format!(
                    "no target named '{}' in configuration",
                    name
                ))));
            }
            filtered
        }
        None => config.targets.clone(),
    };

    let mut set = JoinSet::new();
    for target in targets {
        let engine = config.engine.clone();
        let user_agent = config.user_agent.clone();

        set.spawn(async move {
            let stats = run_target(&target, &engine, &user_agent, fresh).await?;
            Ok::<(String, SessionStats), GleanError>((target.name, stats))
        });
    }

    let mut totals = SessionStats::default();
    let mut first_error: Option<GleanError> = None;

    while let Some(joined) = set.join_next().await {
        match joined? {
            Ok((name, stats)) => {
                tracing::debug!(target_name = %name, "target finished");
                totals.merge(&stats);
            }
            Err(e) => {
                tracing::error!(error = %e, "target failed");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(totals),
    }
}

/// Wires up the production collaborators for one target and runs its
/// session.
async fn run_target(
    target: &TargetConfig,
    engine: &EngineConfig,
    user_agent: &crate::config::UserAgentConfig,
    fresh: bool,
) -> Result<SessionStats> {
    let output_dir = Path::new(&target.output_dir);
    std::fs::create_dir_all(output_dir)?;

    let fetcher = HttpFetcher::new(user_agent)?;
    let mut dedup = FileDedupStore::open(output_dir.join("processed_ids.txt"))?;
    let mut cursors = FileCursorStore::new(output_dir.join("crawler_state.json"));
    let mut sink: Box<dyn DocumentSink + Send> = open_sink(target.sink, output_dir)?;

    run_session(
        target,
        engine,
        &fetcher,
        &mut dedup,
        &mut cursors,
        &mut sink,
        fresh,
    )
    .await
}
