use crate::config::types::{Config, EngineConfig, TargetConfig, UserAgentConfig};
use crate::ConfigError;
use scraper::Selector;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_user_agent_config(&config.user_agent)?;

    if config.targets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one [[target]] is required".to_string(),
        ));
    }

    let mut names = HashSet::new();
    for target in &config.targets {
        if !names.insert(target.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate target name '{}'",
                target.name
            )));
        }
        validate_target(target)?;
    }

    Ok(())
}

fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_pages < 1 {
        return Err(ConfigError::Validation(format!(
            "max_pages must be >= 1, got {}",
            config.max_pages
        )));
    }

    if config.item_delay_min_ms > config.item_delay_max_ms {
        return Err(ConfigError::Validation(format!(
            "item_delay_min_ms ({}) must not exceed item_delay_max_ms ({})",
            config.item_delay_min_ms, config.item_delay_max_ms
        )));
    }

    if config.listing_timeout_secs == 0 || config.detail_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "fetch timeouts must be >= 1 second".to_string(),
        ));
    }

    Ok(())
}

fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.harvester_name.is_empty() {
        return Err(ConfigError::Validation(
            "harvester_name cannot be empty".to_string(),
        ));
    }

    if !config
        .harvester_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "harvester_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.harvester_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("invalid contact_url: {}", e)))?;

    if !config.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "contact_email does not look like an email address: '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

fn validate_target(target: &TargetConfig) -> Result<(), ConfigError> {
    if target.name.is_empty() {
        return Err(ConfigError::Validation(
            "target name cannot be empty".to_string(),
        ));
    }

    validate_http_url(&target.base_url, &target.name)?;

    if !target.page_url_template.contains("{page}") {
        return Err(ConfigError::Validation(format!(
            "target '{}': page_url_template must contain the {{page}} placeholder",
            target.name
        )));
    }
    // The template must still be a valid URL once the placeholder is filled.
    validate_http_url(&target.page_url_template.replace("{page}", "2"), &target.name)?;

    if target.output_dir.is_empty() {
        return Err(ConfigError::Validation(format!(
            "target '{}': output_dir cannot be empty",
            target.name
        )));
    }

    if target.link_selectors.is_empty() {
        return Err(ConfigError::Validation(format!(
            "target '{}': at least one link selector is required",
            target.name
        )));
    }

    for selectors in [
        &target.link_selectors,
        &target.title_selectors,
        &target.date_selectors,
        &target.body_selectors,
        &target.next_selectors,
    ] {
        for selector in selectors {
            validate_selector(selector, &target.name)?;
        }
    }

    Ok(())
}

fn validate_http_url(raw: &str, target_name: &str) -> Result<(), ConfigError> {
    let url = Url::parse(raw).map_err(|e| {
        ConfigError::InvalidUrl(format!("target '{}': {} ({})", target_name, raw, e))
    })?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "target '{}': unsupported scheme in {}",
            target_name, raw
        )));
    }

    Ok(())
}

fn validate_selector(selector: &str, target_name: &str) -> Result<(), ConfigError> {
    Selector::parse(selector).map_err(|e| {
        ConfigError::InvalidSelector(format!(
            "target '{}': '{}' ({:?})",
            target_name, selector, e
        ))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SinkKind;

    fn test_engine() -> EngineConfig {
        EngineConfig {
            max_pages: 10,
            retry_backoff_ms: 0,
            item_delay_min_ms: 0,
            item_delay_max_ms: 0,
            listing_timeout_secs: 5,
            detail_timeout_secs: 5,
            mark_failed_done: false,
        }
    }

    fn test_user_agent() -> UserAgentConfig {
        UserAgentConfig {
            harvester_name: "TestHarvester".to_string(),
            harvester_version: "1.0".to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }

    fn test_target(name: &str) -> TargetConfig {
        TargetConfig {
            name: name.to_string(),
            base_url: "https://example.com/news".to_string(),
            page_url_template: "https://example.com/news/p/{page}".to_string(),
            output_dir: "./out".to_string(),
            sink: SinkKind::Text,
            link_selectors: vec!["h3 a".to_string()],
            link_filters: vec![],
            id_query_param: None,
            title_selectors: vec![],
            date_selectors: vec![],
            body_selectors: vec![],
            next_selectors: vec![],
            stop_markers: vec![],
            marker_line_max_len: 100,
            header_end_marker: None,
            header_scan_lines: 30,
        }
    }

    fn test_config() -> Config {
        Config {
            engine: test_engine(),
            user_agent: test_user_agent(),
            targets: vec![test_target("news")],
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate(&test_config()).is_ok());
    }

    #[test]
    fn test_no_targets_fails() {
        let mut config = test_config();
        config.targets.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_duplicate_target_names_fail() {
        let mut config = test_config();
        config.targets.push(test_target("news"));
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_template_without_placeholder_fails() {
        let mut config = test_config();
        config.targets[0].page_url_template = "https://example.com/news".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_bad_selector_fails() {
        let mut config = test_config();
        config.targets[0].link_selectors = vec!["h3 a[".to_string()];
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidSelector(_))
        ));
    }

    #[test]
    fn test_non_http_base_url_fails() {
        let mut config = test_config();
        config.targets[0].base_url = "ftp://example.com/news".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_inverted_delay_bounds_fail() {
        let mut config = test_config();
        config.engine.item_delay_min_ms = 2000;
        config.engine.item_delay_max_ms = 1000;
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_link_selectors_fail() {
        let mut config = test_config();
        config.targets[0].link_selectors.clear();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::Validation(_))
        ));
    }
}
