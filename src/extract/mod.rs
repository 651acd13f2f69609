//! Selector-based content extraction
//!
//! Extraction is polymorphic over prioritized selector lists: each field
//! (title, date, body) has an ordered set of candidate locations, the first
//! non-empty match wins, and every field has a lowest-fidelity fallback
//! that is always defined. A miss is never an error.
//!
//! Listing pages use the same machinery to discover item links: link
//! selectors yield anchors, hrefs are absolutized against the listing URL,
//! filtered by configured substrings, and deduplicated in order.

use crate::config::TargetConfig;
use crate::ConfigError;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Document fields pulled from a detail page, before normalization
#[derive(Debug, Clone)]
pub struct ExtractedDocument {
    pub title: String,
    pub published_date: String,
    pub url: String,
    pub body: String,
}

/// Compiled selector lists for one target's detail pages
pub struct ExtractionRules {
    title: Vec<Selector>,
    date: Vec<Selector>,
    body: Vec<Selector>,
    title_tag: Selector,
}

impl ExtractionRules {
    pub fn compile(target: &TargetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            title: compile_selectors(&target.title_selectors)?,
            date: compile_selectors(&target.date_selectors)?,
            body: compile_selectors(&target.body_selectors)?,
            title_tag: compile_selector("title")?,
        })
    }
}

/// Compiled link discovery rules for one target's listing pages
pub struct ListingRules {
    link_selectors: Vec<Selector>,
    link_filters: Vec<String>,
}

impl ListingRules {
    pub fn compile(target: &TargetConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            link_selectors: compile_selectors(&target.link_selectors)?,
            link_filters: target.link_filters.clone(),
        })
    }
}

fn compile_selectors(selectors: &[String]) -> Result<Vec<Selector>, ConfigError> {
    selectors.iter().map(|s| compile_selector(s)).collect()
}

fn compile_selector(selector: &str) -> Result<Selector, ConfigError> {
    Selector::parse(selector)
        .map_err(|e| ConfigError::InvalidSelector(format!("'{}' ({:?})", selector, e)))
}

/// Extracts title, date, and body from a detail page.
///
/// Fallback chain per field: title selectors → `<title>` tag → "Untitled";
/// date selectors → "Unknown"; body selectors → full rendered page text.
pub fn extract_document(html: &str, url: &str, rules: &ExtractionRules) -> ExtractedDocument {
    let document = Html::parse_document(html);

    let title = first_match(&document, &rules.title, " ")
        .or_else(|| first_match_one(&document, &rules.title_tag, " "))
        .unwrap_or_else(|| "Untitled".to_string());

    let published_date =
        first_match(&document, &rules.date, " ").unwrap_or_else(|| "Unknown".to_string());

    let body =
        first_match(&document, &rules.body, "\n").unwrap_or_else(|| full_text(&document));

    ExtractedDocument {
        title,
        published_date,
        url: url.to_string(),
        body,
    }
}

/// Discovers item links on a listing page: absolute, filtered, in document
/// order with duplicates removed.
pub fn listing_links(document: &Html, base: &Url, rules: &ListingRules) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for selector in &rules.link_selectors {
        for element in document.select(selector) {
            let Some(href) = element.value().attr("href") else {
                continue;
            };
            let Some(absolute) = resolve_link(href, base) else {
                continue;
            };

            if !rules.link_filters.is_empty()
                && !rules.link_filters.iter().any(|f| absolute.contains(f))
            {
                continue;
            }

            if seen.insert(absolute.clone()) {
                links.push(absolute);
            }
        }
    }

    links
}

/// Resolves an href to an absolute URL, dropping fragments and non-HTTP
/// schemes.
pub fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let mut url = base.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    Some(url.to_string())
}

/// First selector in the list that yields an element with non-empty text.
fn first_match(document: &Html, selectors: &[Selector], separator: &str) -> Option<String> {
    selectors
        .iter()
        .find_map(|selector| first_match_one(document, selector, separator))
}

fn first_match_one(document: &Html, selector: &Selector, separator: &str) -> Option<String> {
    document
        .select(selector)
        .map(|element| element_text(element, separator))
        .find(|text| !text.is_empty())
}

/// Collects an element's text nodes, trimmed and joined.
///
/// Joined with `\n` for body containers this approximates rendered line
/// structure closely enough for the line-oriented normalizer.
fn element_text(element: ElementRef, separator: &str) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Whole-page text: the lowest-fidelity body fallback, always defined.
fn full_text(document: &Html) -> String {
    document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SinkKind, TargetConfig};

    fn test_target() -> TargetConfig {
        TargetConfig {
            name: "test".to_string(),
            base_url: "https://example.com/news".to_string(),
            page_url_template: "https://example.com/news/p/{page}".to_string(),
            output_dir: "./out".to_string(),
            sink: SinkKind::Text,
            link_selectors: vec!["h3 a".to_string(), ".title-news a".to_string()],
            link_filters: vec!["/news/".to_string()],
            id_query_param: None,
            title_selectors: vec!["h1".to_string()],
            date_selectors: vec![".post-time".to_string(), ".date".to_string()],
            body_selectors: vec![".post-content".to_string(), "#content".to_string()],
            next_selectors: vec![],
            stop_markers: vec![],
            marker_line_max_len: 100,
            header_end_marker: None,
            header_scan_lines: 30,
        }
    }

    fn rules() -> ExtractionRules {
        ExtractionRules::compile(&test_target()).unwrap()
    }

    #[test]
    fn test_first_selector_wins() {
        let html = r#"<html><body>
            <h1>Primary title</h1>
            <div class="post-time">2024-01-15</div>
            <div class="date">wrong date</div>
            <div class="post-content"><p>Body text.</p></div>
        </body></html>"#;

        let doc = extract_document(html, "https://example.com/a", &rules());
        assert_eq!(doc.title, "Primary title");
        assert_eq!(doc.published_date, "2024-01-15");
        assert_eq!(doc.body, "Body text.");
    }

    #[test]
    fn test_empty_match_falls_through_to_next_selector() {
        let html = r#"<html><body>
            <div class="post-time">  </div>
            <div class="date">2024-02-02</div>
        </body></html>"#;

        let doc = extract_document(html, "https://example.com/a", &rules());
        assert_eq!(doc.published_date, "2024-02-02");
    }

    #[test]
    fn test_title_falls_back_to_title_tag() {
        let html = r#"<html><head><title>Tab title</title></head><body></body></html>"#;

        let doc = extract_document(html, "https://example.com/a", &rules());
        assert_eq!(doc.title, "Tab title");
    }

    #[test]
    fn test_missing_everything_uses_lowest_fidelity_defaults() {
        let html = "<html><body><p>stray text</p></body></html>";

        let doc = extract_document(html, "https://example.com/a", &rules());
        assert_eq!(doc.title, "Untitled");
        assert_eq!(doc.published_date, "Unknown");
        // Body falls back to full page text.
        assert_eq!(doc.body, "stray text");
    }

    #[test]
    fn test_body_joins_block_texts_as_lines() {
        let html = r#"<html><body><div class="post-content">
            <p>First paragraph.</p>
            <p>Second paragraph.</p>
        </div></body></html>"#;

        let doc = extract_document(html, "https://example.com/a", &rules());
        assert_eq!(doc.body, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_listing_links_absolutized_filtered_deduped() {
        let html = r#"<html><body>
            <h3><a href="/news/one">One</a></h3>
            <h3><a href="/news/two">Two</a></h3>
            <h3><a href="/news/one">One again</a></h3>
            <h3><a href="/other/three">Filtered out</a></h3>
            <h3><a href="https://elsewhere.example/news/four">Absolute kept</a></h3>
        </body></html>"#;

        let base = Url::parse("https://example.com/news").unwrap();
        let listing = ListingRules::compile(&test_target()).unwrap();
        let document = Html::parse_document(html);

        let links = listing_links(&document, &base, &listing);
        assert_eq!(
            links,
            vec![
                "https://example.com/news/one".to_string(),
                "https://example.com/news/two".to_string(),
                "https://elsewhere.example/news/four".to_string(),
            ]
        );
    }

    #[test]
    fn test_resolve_link_rejects_non_http() {
        let base = Url::parse("https://example.com/").unwrap();
        assert!(resolve_link("mailto:a@example.com", &base).is_none());
        assert!(resolve_link("javascript:void(0)", &base).is_none());
        assert!(resolve_link("", &base).is_none());
    }

    #[test]
    fn test_resolve_link_strips_fragment() {
        let base = Url::parse("https://example.com/").unwrap();
        assert_eq!(
            resolve_link("/page#section", &base),
            Some("https://example.com/page".to_string())
        );
    }
}
