//! Full-session tests driving the engine loop with a canned fetcher.
//!
//! These exercise the walk/process/persist cycle end to end: termination,
//! the maximum-page bound, idempotent re-runs, resume from a persisted
//! cursor, skipped listing pages, and the unmarked-on-failure retry
//! contract.

use gleaner::config::{EngineConfig, SinkKind, TargetConfig};
use gleaner::engine::run_session;
use gleaner::fetch::{FetchOutcome, PageFetcher};
use gleaner::sink::{MemorySink, TextFileSink};
use gleaner::store::{
    CrawlCursor, CursorStore, DedupStore, FileCursorStore, FileDedupStore, MemoryCursorStore,
    MemoryDedupStore,
};
use gleaner::GleanError;
use std::collections::HashMap;
use std::time::Duration;
use tempfile::TempDir;

/// Fetcher serving canned bodies per URL. Unknown URLs answer HTTP 404.
struct SiteFetcher {
    pages: HashMap<String, FetchOutcome>,
}

impl SiteFetcher {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
        }
    }

    fn serve(&mut self, url: &str, body: &str) {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Success {
                final_url: url.to_string(),
                body: body.to_string(),
            },
        );
    }

    fn fail_transient(&mut self, url: &str) {
        self.pages.insert(
            url.to_string(),
            FetchOutcome::Transient {
                error: "HTTP 500".to_string(),
            },
        );
    }
}

impl PageFetcher for SiteFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> FetchOutcome {
        self.pages.get(url).cloned().unwrap_or(FetchOutcome::Fatal {
            error: "HTTP 404".to_string(),
        })
    }
}

fn target() -> TargetConfig {
    TargetConfig {
        name: "news".to_string(),
        base_url: "https://example.com/news".to_string(),
        page_url_template: "https://example.com/news/p/{page}".to_string(),
        output_dir: "./out".to_string(),
        sink: SinkKind::Text,
        link_selectors: vec!["h3 a".to_string()],
        link_filters: vec![],
        id_query_param: None,
        title_selectors: vec!["h1".to_string()],
        date_selectors: vec![".post-time".to_string()],
        body_selectors: vec![".post-content".to_string()],
        next_selectors: vec![],
        stop_markers: vec![],
        marker_line_max_len: 100,
        header_end_marker: None,
        header_scan_lines: 30,
    }
}

fn engine() -> EngineConfig {
    EngineConfig {
        max_pages: 50,
        retry_backoff_ms: 0,
        item_delay_min_ms: 0,
        item_delay_max_ms: 0,
        listing_timeout_secs: 5,
        detail_timeout_secs: 5,
        mark_failed_done: false,
    }
}

/// Listing page with item links and optionally a link to the next page
/// (which the walker recognizes via the page URL template).
fn listing(items: &[&str], next_page: Option<u32>) -> String {
    let mut html = String::from("<html><body>");
    for slug in items {
        html.push_str(&format!(r#"<h3><a href="/news/{slug}">{slug}</a></h3>"#));
    }
    if let Some(n) = next_page {
        html.push_str(&format!(r#"<a href="/news/p/{n}">{n}</a>"#));
    }
    html.push_str("</body></html>");
    html
}

fn article(title: &str) -> String {
    format!(
        r#"<html><body>
            <h1>{title}</h1>
            <div class="post-time">2024-03-01</div>
            <div class="post-content"><p>Body of {title}.</p></div>
        </body></html>"#
    )
}

/// A two-page site: page 1 links to page 2, page 2 is the last page.
fn two_page_site() -> SiteFetcher {
    let mut site = SiteFetcher::new();
    site.serve("https://example.com/news", &listing(&["one", "two"], Some(2)));
    site.serve("https://example.com/news/p/2", &listing(&["three"], None));
    site.serve("https://example.com/news/one", &article("First"));
    site.serve("https://example.com/news/two", &article("Second"));
    site.serve("https://example.com/news/three", &article("Third"));
    site
}

#[tokio::test]
async fn test_walk_terminates_on_last_page() {
    let target = target();
    let engine = engine();
    let site = two_page_site();

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 2);
    assert_eq!(stats.items_discovered, 3);
    assert_eq!(stats.items_stored, 3);
    assert_eq!(stats.items_skipped, 0);
    assert_eq!(sink.stored(), 3);
    assert_eq!(cursors.saved(), Some(CrawlCursor::at(2)));

    let titles: Vec<&str> = sink.docs().iter().map(|d| d.title.as_str()).collect();
    assert_eq!(titles, vec!["First", "Second", "Third"]);
}

#[tokio::test]
async fn test_max_pages_bounds_the_walk() {
    let target = target();
    let mut engine = engine();
    engine.max_pages = 3;

    // Every page advertises a next page; only the configured bound stops
    // the walk.
    let mut site = SiteFetcher::new();
    site.serve("https://example.com/news", &listing(&["a1"], Some(2)));
    site.serve("https://example.com/news/p/2", &listing(&["a2"], Some(3)));
    site.serve("https://example.com/news/p/3", &listing(&["a3"], Some(4)));
    site.serve("https://example.com/news/p/4", &listing(&["a4"], Some(5)));
    for slug in ["a1", "a2", "a3", "a4"] {
        site.serve(&format!("https://example.com/news/{slug}"), &article(slug));
    }

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 3);
    assert_eq!(stats.items_stored, 3);
    assert_eq!(sink.stored(), 3, "page 4 must never be reached");
}

#[tokio::test]
async fn test_rerun_is_idempotent() {
    let target = target();
    let engine = engine();
    let site = two_page_site();

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();

    let first = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();
    assert_eq!(first.items_stored, 3);

    // Fresh restart over the same dedup state: everything rediscovered is
    // a duplicate, nothing is stored twice.
    let second = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, true)
        .await
        .unwrap();

    assert_eq!(second.items_stored, 0);
    assert_eq!(second.items_duplicate, 3);
    assert_eq!(sink.stored(), 3);
}

#[tokio::test]
async fn test_resume_starts_at_persisted_cursor() {
    let target = target();
    let engine = engine();

    // Only page 2 exists; reaching for page 1 would abort with an
    // unreachable-root error, so a clean run proves the resume.
    let mut site = SiteFetcher::new();
    site.serve("https://example.com/news/p/2", &listing(&["three"], None));
    site.serve("https://example.com/news/three", &article("Third"));

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    cursors.save(CrawlCursor::at(2)).unwrap();
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 1);
    assert_eq!(stats.items_stored, 1);
    assert_eq!(sink.docs()[0].title, "Third");
}

#[tokio::test]
async fn test_fresh_flag_ignores_persisted_cursor() {
    let target = target();
    let engine = engine();

    let mut site = SiteFetcher::new();
    site.serve("https://example.com/news", &listing(&["one"], None));
    site.serve("https://example.com/news/one", &article("First"));

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    cursors.save(CrawlCursor::at(7)).unwrap();
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, true)
        .await
        .unwrap();

    assert_eq!(stats.pages_visited, 1);
    assert_eq!(stats.items_stored, 1);
}

#[tokio::test]
async fn test_failed_listing_page_is_skipped_not_fatal() {
    let target = target();
    let engine = engine();

    let mut site = two_page_site();
    site.fail_transient("https://example.com/news");

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();

    // Page 1 skipped after the retry, page 2 still harvested.
    assert_eq!(stats.pages_skipped, 1);
    assert_eq!(stats.pages_visited, 1);
    assert_eq!(stats.items_stored, 1);
    assert_eq!(sink.docs()[0].title, "Third");
}

#[tokio::test]
async fn test_unreachable_root_aborts_the_run() {
    let target = target();
    let engine = engine();
    let site = SiteFetcher::new();

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();

    let result =
        run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false).await;

    assert!(matches!(
        result,
        Err(GleanError::ListingUnreachable { ref target, .. }) if target == "news"
    ));
}

#[tokio::test]
async fn test_failed_items_are_retried_on_the_next_run() {
    let target = target();
    let engine = engine();
    let site = two_page_site();

    let mut dedup = MemoryDedupStore::new();
    let mut cursors = MemoryCursorStore::new();
    let mut sink = MemorySink::new();
    sink.set_failing(true);

    let first = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
        .await
        .unwrap();

    assert_eq!(first.items_skipped, 3);
    assert_eq!(first.items_stored, 0);
    assert!(dedup.is_empty(), "failed items must stay unmarked");

    // Sink recovers; a fresh walk over the same dedup state picks the
    // items up again.
    sink.set_failing(false);
    let second = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, true)
        .await
        .unwrap();

    assert_eq!(second.items_stored, 3);
    assert_eq!(sink.stored(), 3);
}

#[tokio::test]
async fn test_file_backed_state_survives_restart() {
    let target = target();
    let engine = engine();
    let site = two_page_site();
    let dir = TempDir::new().unwrap();

    let ids_path = dir.path().join("processed_ids.txt");
    let cursor_path = dir.path().join("crawler_state.json");

    {
        let mut dedup = FileDedupStore::open(&ids_path).unwrap();
        let mut cursors = FileCursorStore::new(&cursor_path);
        let mut sink = TextFileSink::new(dir.path().join("docs")).unwrap();

        let stats =
            run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, false)
                .await
                .unwrap();
        assert_eq!(stats.items_stored, 3);
    }

    let ids = std::fs::read_to_string(&ids_path).unwrap();
    let lines: Vec<&str> = ids.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines.contains(&"https://example.com/news/one"));
    assert!(lines.contains(&"https://example.com/news/three"));

    let state = std::fs::read_to_string(&cursor_path).unwrap();
    assert_eq!(state, r#"{"last_page":2}"#);

    let doc = std::fs::read_to_string(dir.path().join("docs").join("First.txt")).unwrap();
    assert!(doc.starts_with("Title: First\nDate: 2024-03-01\nURL: https://example.com/news/one\n"));
    assert!(doc.ends_with("Body of First."));

    // Reopened stores make a repeat run a no-op.
    let mut dedup = FileDedupStore::open(&ids_path).unwrap();
    let mut cursors = FileCursorStore::new(&cursor_path);
    let mut sink = MemorySink::new();

    let stats = run_session(&target, &engine, &site, &mut dedup, &mut cursors, &mut sink, true)
        .await
        .unwrap();

    assert_eq!(stats.items_stored, 0);
    assert_eq!(stats.items_duplicate, 3);
    assert_eq!(sink.stored(), 0);
}
