use crate::config::types::{Config, CrawlerConfig, FetchConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetch_config(&config.fetch)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawl limits
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // max_depth and max_link_per_page may legitimately be zero

    require_positive("max_connections", config.max_connections)?;
    require_positive("max_host_connections", config.max_host_connections)?;
    require_positive("max_total", config.max_total)?;
    require_positive("max_requests", config.max_requests)?;

    if config.max_host_connections > config.max_connections {
        return Err(ConfigError::Validation(format!(
            "max_host_connections ({}) cannot exceed max_connections ({})",
            config.max_host_connections, config.max_connections
        )));
    }

    if config.tick_millis == 0 {
        return Err(ConfigError::Validation(
            "tick_millis must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates transport settings
fn validate_fetch_config(config: &FetchConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    if config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "connect_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.sink_path.is_empty() {
        return Err(ConfigError::Validation(
            "sink_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

fn require_positive(name: &str, value: usize) -> Result<(), ConfigError> {
    if value < 1 {
        return Err(ConfigError::Validation(format!(
            "{} must be >= 1, got {}",
            name, value
        )));
    }
    Ok(())
}
