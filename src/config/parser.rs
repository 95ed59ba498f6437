use crate::config::types::{Config, Secret};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Environment variable holding the domain root
pub const DOMAIN_ENV: &str = "DOMAIN";

/// Environment variable holding the blob container name
pub const CONTAINER_NAME_ENV: &str = "AZURE_BLOB_STORAGE_CONTAINER_NAME";

/// Loads a configuration file, overlays the process environment and validates
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use site_archiver::config::load_config;
///
/// let config = load_config(Path::new("archiver.toml")).unwrap();
/// println!("Archiving: {}", config.site.domain_root);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut config: Config = toml::from_str(&content)?;

    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Builds a configuration purely from environment variables
///
/// This mirrors a deployment with no config file: `DOMAIN`,
/// `AZURE_BLOB_STORAGE_CONNECTION_STRING` and
/// `AZURE_BLOB_STORAGE_CONTAINER_NAME` supply everything required.
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    let mut config = Config::default();

    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Overlays environment values onto a configuration
///
/// Environment values win over file values. The storage secret is only ever
/// read here, from the variable named by `storage.connection-string-env`.
pub fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(domain) = non_empty(DOMAIN_ENV) {
        config.site.domain_root = domain;
    }

    if let Some(container) = non_empty(CONTAINER_NAME_ENV) {
        config.storage.container_name = container;
    }

    if let Some(secret) = non_empty(&config.storage.connection_string_env) {
        config.secret = Some(Secret::new(secret));
    }
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so that runs can be matched to the configuration they used.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let result = hasher.finalize();
    Ok(hex::encode(result))
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}
