//! Configuration module
//!
//! Configuration is a single TOML file: an `[engine]` section with the
//! shared harvesting policy, a `[user-agent]` identity block, and one
//! `[[target]]` table per harvest source carrying that site's selectors,
//! URL template, markers, and output location.

mod parser;
mod types;
mod validation;

pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use types::{Config, EngineConfig, SinkKind, TargetConfig, UserAgentConfig};
pub use validation::validate;
