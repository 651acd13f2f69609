//! Listing walker
//!
//! Drives the pagination state machine for one target: fetch a listing
//! page, discover item references, decide whether the walk continues.
//! Transient listing failures get one retry after a fixed backoff and then
//! skip the page as a recoverable event — the walk itself never aborts for
//! a single bad page. Only an unreachable listing root (no page harvested
//! yet) is fatal to the run.

use crate::config::{EngineConfig, TargetConfig};
use crate::extract::{listing_links, ListingRules};
use crate::fetch::{FetchOutcome, PageFetcher};
use crate::store::CrawlCursor;
use crate::{GleanError, Result};
use scraper::{Html, Selector};
use std::time::Duration;
use url::Url;

/// One discovered unit of content awaiting processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
    /// Stable identifier, derived deterministically from the URL so
    /// rediscovery never creates duplicates.
    pub id: String,
    pub url: String,
    pub discovered_at_page: u32,
}

/// Outcome of walking one listing page
#[derive(Debug)]
pub enum ListingPage {
    /// Page fetched and scanned.
    Fetched {
        items: Vec<WorkItem>,
        /// Whether any next-page probe fired.
        has_more: bool,
    },

    /// Page skipped after a failed retry; the walk continues on the next
    /// page number.
    Skipped,
}

/// Strategies for detecting a next listing page, tried in this order;
/// the first positive signal wins.
#[derive(Debug, Clone, Copy)]
enum NextPageProbe {
    /// A link whose href resolves to the URL the page template predicts
    /// for page n+1.
    PredictedLink,

    /// A generic next affordance: configured selectors, or an anchor whose
    /// text is a forward symbol.
    NextAffordance,
}

const PROBE_ORDER: [NextPageProbe; 2] = [NextPageProbe::PredictedLink, NextPageProbe::NextAffordance];

/// Walks one target's paginated listing
pub struct ListingWalker<'a, F> {
    target: &'a TargetConfig,
    engine: &'a EngineConfig,
    fetcher: &'a F,
    listing_rules: ListingRules,
    next_selectors: Vec<Selector>,
    anchor_selector: Selector,
    base: Url,
}

impl<'a, F: PageFetcher> ListingWalker<'a, F> {
    pub fn new(
        target: &'a TargetConfig,
        engine: &'a EngineConfig,
        fetcher: &'a F,
    ) -> Result<Self> {
        let listing_rules = ListingRules::compile(target)?;

        let next_selectors = target
            .next_selectors
            .iter()
            .map(|s| {
                Selector::parse(s).map_err(|e| {
                    crate::ConfigError::InvalidSelector(format!("'{}' ({:?})", s, e))
                })
            })
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let anchor_selector = Selector::parse("a")
            .map_err(|e| crate::ConfigError::InvalidSelector(format!("'a' ({:?})", e)))?;

        let base = Url::parse(&target.base_url)?;

        Ok(Self {
            target,
            engine,
            fetcher,
            listing_rules,
            next_selectors,
            anchor_selector,
            base,
        })
    }

    /// URL of the given listing page. Page 1 is the bare base URL; later
    /// pages come from the template.
    pub fn page_url(&self, page: u32) -> String {
        if page <= 1 {
            self.target.base_url.clone()
        } else {
            self.target
                .page_url_template
                .replace("{page}", &page.to_string())
        }
    }

    /// Fetches and scans the listing page under the cursor.
    ///
    /// `pages_harvested` is how many listing pages this session has already
    /// fetched successfully; it decides whether a fatal response means an
    /// unreachable root (abort) or a dead end mid-walk (stop).
    pub async fn next_page(
        &self,
        cursor: CrawlCursor,
        pages_harvested: u32,
    ) -> Result<ListingPage> {
        let url = self.page_url(cursor.page);
        tracing::debug!(target_name = %self.target.name, page = cursor.page, url = %url, "fetching listing page");

        let body = match self.fetch_with_retry(&url).await {
            FetchOutcome::Success { body, .. } => body,
            FetchOutcome::Transient { error } => {
                tracing::warn!(
                    target_name = %self.target.name,
                    page = cursor.page,
                    %error,
                    "listing page still failing after retry, skipping page"
                );
                return Ok(ListingPage::Skipped);
            }
            FetchOutcome::Fatal { error } => {
                if pages_harvested == 0 {
                    return Err(GleanError::ListingUnreachable {
                        target: self.target.name.clone(),
                        reason: error,
                    });
                }
                tracing::warn!(
                    target_name = %self.target.name,
                    page = cursor.page,
                    %error,
                    "listing page gone, ending walk"
                );
                return Ok(ListingPage::Fetched {
                    items: Vec::new(),
                    has_more: false,
                });
            }
        };

        let (items, has_more) = self.scan_listing(&body, cursor.page);
        tracing::debug!(
            target_name = %self.target.name,
            page = cursor.page,
            items = items.len(),
            has_more,
            "listing page scanned"
        );

        Ok(ListingPage::Fetched { items, has_more })
    }

    async fn fetch_with_retry(&self, url: &str) -> FetchOutcome {
        let timeout = Duration::from_secs(self.engine.listing_timeout_secs);

        let first = self.fetcher.fetch(url, timeout).await;
        if !first.is_transient() {
            return first;
        }

        if let FetchOutcome::Transient { error } = &first {
            tracing::warn!(
                target_name = %self.target.name,
                %url,
                %error,
                backoff_ms = self.engine.retry_backoff_ms,
                "transient listing failure, retrying once"
            );
        }
        tokio::time::sleep(Duration::from_millis(self.engine.retry_backoff_ms)).await;

        self.fetcher.fetch(url, timeout).await
    }

    /// Scans a fetched listing body for items and a next-page signal.
    /// Synchronous: the parsed DOM never crosses an await point.
    fn scan_listing(&self, body: &str, page: u32) -> (Vec<WorkItem>, bool) {
        let document = Html::parse_document(body);

        let items = listing_links(&document, &self.base, &self.listing_rules)
            .into_iter()
            .map(|url| WorkItem {
                id: derive_item_id(&url, self.target.id_query_param.as_deref()),
                url,
                discovered_at_page: page,
            })
            .collect();

        let has_more = PROBE_ORDER
            .iter()
            .any(|probe| self.probe_next(*probe, &document, page));

        (items, has_more)
    }

    fn probe_next(&self, probe: NextPageProbe, document: &Html, page: u32) -> bool {
        match probe {
            NextPageProbe::PredictedLink => {
                let predicted = self
                    .target
                    .page_url_template
                    .replace("{page}", &(page + 1).to_string());

                document
                    .select(&self.anchor_selector)
                    .filter_map(|element| element.value().attr("href"))
                    .any(|href| {
                        crate::extract::resolve_link(href, &self.base)
                            .is_some_and(|abs| abs == predicted)
                    })
            }

            NextPageProbe::NextAffordance => {
                if self
                    .next_selectors
                    .iter()
                    .any(|selector| document.select(selector).next().is_some())
                {
                    return true;
                }

                // Fall back to anchors labelled with a forward symbol.
                document
                    .select(&self.anchor_selector)
                    .map(|element| element.text().collect::<String>().trim().to_string())
                    .any(|text| matches!(text.as_str(), ">" | "›" | "»"))
            }
        }
    }
}

/// Derives the stable item id from an item URL: the configured query
/// parameter's value when present, else the URL itself.
pub fn derive_item_id(url: &str, id_query_param: Option<&str>) -> String {
    if let Some(param) = id_query_param {
        if let Ok(parsed) = Url::parse(url) {
            if let Some((_, value)) = parsed.query_pairs().find(|(key, _)| key == param) {
                if !value.is_empty() {
                    return value.into_owned();
                }
            }
        }
    }
    url.to_string()
}
