use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Fetch timeout is non-zero
/// - Search concurrency and deadline are non-zero
/// - Relay URL is non-empty when a relay section is present
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.fetch.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "fetch.timeout_secs cannot be 0".to_string(),
        ));
    }

    if config.search.max_concurrent_indexers == 0 {
        return Err(ConfigError::ValidationError(
            "search.max_concurrent_indexers cannot be 0".to_string(),
        ));
    }

    if config.search.deadline_secs == 0 {
        return Err(ConfigError::ValidationError(
            "search.deadline_secs cannot be 0".to_string(),
        ));
    }

    if let Some(relay) = &config.relay {
        if relay.url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "relay.url cannot be empty".to_string(),
            ));
        }
    }

    Ok(())
}
