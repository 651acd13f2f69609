//! Page-fetch capability
//!
//! Fetching is a narrow seam: given a URL and a timeout, a fetcher returns
//! one of three outcomes. Retry-or-skip is an explicit decision made once
//! by the walker and processor from the outcome, never scattered through
//! call sites as exception handling.

mod http;

pub use http::HttpFetcher;

use std::future::Future;
use std::time::Duration;

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// Page body content
        body: String,
    },

    /// Failure worth one retry: timeouts, connection failures, 5xx, 429
    Transient {
        /// Error description
        error: String,
    },

    /// Failure retrying cannot fix: 4xx responses, malformed requests
    Fatal {
        /// Error description
        error: String,
    },
}

impl FetchOutcome {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Capability to fetch a rendered page body for a URL.
///
/// The engine is generic over this trait; tests drive it with canned
/// in-memory fetchers.
pub trait PageFetcher {
    fn fetch(
        &self,
        url: &str,
        timeout: Duration,
    ) -> impl Future<Output = FetchOutcome> + Send;
}
