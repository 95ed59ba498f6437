use crate::config::types::{Config, CrawlerConfig, StorageConfig};
use crate::url::DomainRoot;
use crate::ConfigError;
use chrono::format::{Item, StrftimeItems};
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_domain_root(&config.site.domain_root)?;
    validate_storage_config(&config.storage)?;
    validate_crawler_config(&config.crawler)?;

    if config.secret.is_none() {
        return Err(ConfigError::MissingEnv(
            config.storage.connection_string_env.clone(),
        ));
    }

    Ok(())
}

/// Validates the domain root address
fn validate_domain_root(domain_root: &str) -> Result<(), ConfigError> {
    if domain_root.is_empty() {
        return Err(ConfigError::Validation(
            "site.domain-root (or DOMAIN) must be set".to_string(),
        ));
    }

    DomainRoot::parse(domain_root)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid domain root: {}", e)))?;

    Ok(())
}

/// Validates object storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    validate_container_name(&config.container_name)?;
    validate_account_name(&config.account_name)?;

    if let Some(endpoint) = &config.endpoint {
        Url::parse(endpoint)
            .map_err(|e| ConfigError::InvalidUrl(format!("Invalid storage endpoint: {}", e)))?;
    }

    validate_date_format(&config.date_format)?;

    if config.connection_string_env.is_empty() {
        return Err(ConfigError::Validation(
            "connection-string-env cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_requests < 1 || config.max_concurrent_requests > 64 {
        return Err(ConfigError::Validation(format!(
            "max-concurrent-requests must be between 1 and 64, got {}",
            config.max_concurrent_requests
        )));
    }

    if config.request_timeout_secs < 1 {
        return Err(ConfigError::Validation(
            "request-timeout-secs must be >= 1".to_string(),
        ));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max-retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.retry_delay_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "retry-delay-ms must be <= 60000, got {}",
            config.retry_delay_ms
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Container names: 3-63 chars, lowercase letters, digits and single hyphens,
/// starting and ending with a letter or digit
fn validate_container_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "storage.container-name (or AZURE_BLOB_STORAGE_CONTAINER_NAME) must be set"
                .to_string(),
        ));
    }

    if name.len() < 3 || name.len() > 63 {
        return Err(ConfigError::Validation(format!(
            "Container name '{}' must be between 3 and 63 characters",
            name
        )));
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Container name '{}' may only contain lowercase letters, digits and hyphens",
            name
        )));
    }

    if name.starts_with('-') || name.ends_with('-') || name.contains("--") {
        return Err(ConfigError::Validation(format!(
            "Container name '{}' cannot start or end with '-' or contain '--'",
            name
        )));
    }

    Ok(())
}

/// Storage account names: 3-24 lowercase letters and digits
fn validate_account_name(name: &str) -> Result<(), ConfigError> {
    if name.len() < 3
        || name.len() > 24
        || !name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
    {
        return Err(ConfigError::Validation(format!(
            "Account name '{}' must be 3-24 lowercase letters or digits",
            name
        )));
    }

    Ok(())
}

/// The date partition must render to a single, non-empty key segment
fn validate_date_format(format: &str) -> Result<(), ConfigError> {
    if format.is_empty() || format.contains('/') {
        return Err(ConfigError::Validation(format!(
            "date-format '{}' must be non-empty and cannot contain '/'",
            format
        )));
    }

    if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
        return Err(ConfigError::Validation(format!(
            "date-format '{}' is not a valid strftime pattern",
            format
        )));
    }

    Ok(())
}
