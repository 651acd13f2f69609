use serde::Deserialize;

/// Main configuration structure for Gleaner
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub engine: EngineConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    #[serde(rename = "target", default)]
    pub targets: Vec<TargetConfig>,
}

/// Shared harvesting policy applied to every target
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Safety bound on the pagination walk, against infinite loops caused
    /// by selector drift.
    #[serde(rename = "max-pages", default = "default_max_pages")]
    pub max_pages: u32,

    /// Fixed backoff before the single retry of a failed fetch
    /// (milliseconds).
    #[serde(rename = "retry-backoff-ms", default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    /// Lower bound of the jittered politeness delay before each item fetch
    /// (milliseconds).
    #[serde(rename = "item-delay-min-ms", default = "default_item_delay_min_ms")]
    pub item_delay_min_ms: u64,

    /// Upper bound of the jittered politeness delay (milliseconds).
    #[serde(rename = "item-delay-max-ms", default = "default_item_delay_max_ms")]
    pub item_delay_max_ms: u64,

    /// Timeout for listing page fetches (seconds).
    #[serde(rename = "listing-timeout-secs", default = "default_listing_timeout")]
    pub listing_timeout_secs: u64,

    /// Timeout for item detail fetches (seconds).
    #[serde(rename = "detail-timeout-secs", default = "default_detail_timeout")]
    pub detail_timeout_secs: u64,

    /// When true, an item whose fetch or sink write failed is still marked
    /// done so it is never retried. Default false: only a successful sink
    /// write marks an item done.
    #[serde(rename = "mark-failed-done", default)]
    pub mark_failed_done: bool,
}

fn default_max_pages() -> u32 {
    500
}

fn default_retry_backoff_ms() -> u64 {
    5_000
}

fn default_item_delay_min_ms() -> u64 {
    1_000
}

fn default_item_delay_max_ms() -> u64 {
    5_000
}

fn default_listing_timeout() -> u64 {
    60
}

fn default_detail_timeout() -> u64 {
    30
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct UserAgentConfig {
    #[serde(rename = "harvester-name")]
    pub harvester_name: String,

    #[serde(rename = "harvester-version")]
    pub harvester_version: String,

    /// URL with information about the harvester
    #[serde(rename = "contact-url")]
    pub contact_url: String,

    /// Email address for harvester-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: String,
}

/// Which sink implementation a target stores documents into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// One text file per document under the output directory.
    #[default]
    Text,

    /// A `documents.db` SQLite database under the output directory.
    Sqlite,
}

/// One harvest source: a paginated listing plus the selectors and cleaning
/// rules specific to that site
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    /// Unique name, used in logs and state file paths.
    pub name: String,

    /// URL of the first listing page.
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// URL template for listing pages past the first; `{page}` is replaced
    /// with the 1-based page number (e.g. `https://example.com/news/p/{page}`).
    #[serde(rename = "page-url-template")]
    pub page_url_template: String,

    /// Directory receiving documents and session state files.
    #[serde(rename = "output-dir")]
    pub output_dir: String,

    #[serde(default)]
    pub sink: SinkKind,

    /// CSS selectors locating item links on a listing page, in priority
    /// order.
    #[serde(rename = "link-selectors")]
    pub link_selectors: Vec<String>,

    /// Substring filters an absolutized item URL must match (any of).
    /// Empty means accept everything the selectors yield.
    #[serde(rename = "link-filters", default)]
    pub link_filters: Vec<String>,

    /// URL query parameter carrying a stable item id (e.g. `ItemID`).
    /// When absent the normalized URL itself is the id.
    #[serde(rename = "id-query-param", default)]
    pub id_query_param: Option<String>,

    /// CSS selectors for the document title, in priority order.
    #[serde(rename = "title-selectors", default)]
    pub title_selectors: Vec<String>,

    /// CSS selectors for the publication date, in priority order.
    #[serde(rename = "date-selectors", default)]
    pub date_selectors: Vec<String>,

    /// CSS selectors for the body container, in priority order.
    #[serde(rename = "body-selectors", default)]
    pub body_selectors: Vec<String>,

    /// CSS selectors for a next-page affordance on the listing.
    #[serde(rename = "next-selectors", default)]
    pub next_selectors: Vec<String>,

    /// Stop markers for the trailing cut of the normalizer.
    #[serde(rename = "stop-markers", default)]
    pub stop_markers: Vec<String>,

    /// Length gate for stop-marker lines (characters).
    #[serde(rename = "marker-line-max-len", default = "default_marker_line_max_len")]
    pub marker_line_max_len: usize,

    /// Marker ending a leading header block, if the site has one.
    #[serde(rename = "header-end-marker", default)]
    pub header_end_marker: Option<String>,

    /// How many lines from the top to search for the header-end marker.
    #[serde(rename = "header-scan-lines", default = "default_header_scan_lines")]
    pub header_scan_lines: usize,
}

fn default_marker_line_max_len() -> usize {
    100
}

fn default_header_scan_lines() -> usize {
    30
}
