use crate::config::types::{Config, CrawlerConfig, OutputConfig, PlatformConfig, UserAgentConfig};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_platform_config(&config.platform)?;
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates platform configuration
fn validate_platform_config(config: &PlatformConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("base-url", &config.base_url),
        ("media-url", &config.media_url),
        ("feed-url", &config.feed_url),
    ] {
        let url = Url::parse(value)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", name, e)))?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::Validation(format!(
                "{} must be an HTTP(S) URL, got '{}'",
                name, value
            )));
        }
    }

    if config.doi_token.is_empty() {
        return Err(ConfigError::Validation(
            "doi-token cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_workers < 1 || config.max_workers > 32 {
        return Err(ConfigError::Validation(format!(
            "max-workers must be between 1 and 32, got {}",
            config.max_workers
        )));
    }

    if config.max_in_flight < config.max_workers {
        return Err(ConfigError::Validation(format!(
            "max-in-flight ({}) must be at least max-workers ({})",
            config.max_in_flight, config.max_workers
        )));
    }

    if config.fetch_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "fetch-timeout-secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler-name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler-name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact-url: {}", e)))?;

    if !config.contact_email.contains('@') {
        return Err(ConfigError::Validation(format!(
            "contact-email must be an email address, got '{}'",
            config.contact_email
        )));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.research_dir.is_empty() {
        return Err(ConfigError::Validation(
            "research-dir cannot be empty".to_string(),
        ));
    }

    if config.stats_path.is_empty() {
        return Err(ConfigError::Validation(
            "stats-path cannot be empty".to_string(),
        ));
    }

    Ok(())
}
