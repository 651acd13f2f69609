//! Gleaner: a resumable harvester for paginated listing sites
//!
//! This crate implements the shared engine behind a family of site-specific
//! harvesters: a pagination-driving listing walker, a crash-safe dedup and
//! cursor store, a pure content normalizer, and narrow seams for fetching,
//! extraction, and durable document storage. Site specifics live entirely
//! in configuration.

pub mod config;
pub mod engine;
pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod processor;
pub mod sink;
pub mod store;
pub mod walker;

use thiserror::Error;

/// Main error type for Gleaner operations
#[derive(Debug, Error)]
pub enum GleanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Listing root unreachable for target '{target}': {reason}")]
    ListingUnreachable { target: String, reason: String },

    #[error("State store error: {0}")]
    Store(#[from] store::StoreError),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task join error: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid CSS selector in config: {0}")]
    InvalidSelector(String),
}

/// Result type alias for Gleaner operations
pub type Result<T> = std::result::Result<T, GleanError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use engine::{run_session, run_targets, SessionStats};
pub use normalize::{clean_content, CleanRules};
pub use store::{CrawlCursor, CursorStore, DedupStore};
pub use walker::WorkItem;
