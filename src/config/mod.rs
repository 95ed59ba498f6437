//! Configuration module for Site-Archiver
//!
//! This module handles loading, parsing, and validating configuration from a
//! TOML file and the process environment.
//!
//! # Example
//!
//! ```no_run
//! use site_archiver::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("archiver.toml")).unwrap();
//! println!("Archiving into container: {}", config.storage.container_name);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, RelativeLinkPolicy, Secret, SiteConfig, StorageConfig,
};

// Re-export parser functions
pub use parser::{
    apply_env, compute_config_hash, load_config, load_config_from_env, load_config_with_hash,
    CONTAINER_NAME_ENV, DOMAIN_ENV,
};
pub use validation::validate;
