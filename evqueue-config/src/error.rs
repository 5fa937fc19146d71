//! Typed error variants for the evqueue-config crate.
//!
//! Provides structured error types for config I/O and validation so callers
//! can match on specific failure modes instead of opaque `anyhow` strings.

use thiserror::Error;

/// Errors that can occur when loading, saving or validating configuration.
///
/// # Example
///
/// ```rust,no_run
/// use evqueue_config::{ConfigError, EventQueueConfig};
///
/// match EventQueueConfig::load_from_path("evqueue.yaml") {
///     Ok(config) => println!("retry after {}ms", config.suspend_retry_timeout_ms),
///     Err(ConfigError::Io(io)) => eprintln!("I/O error: {io}"),
///     Err(ConfigError::Parse(p)) => eprintln!("YAML parse error: {p}"),
///     Err(ConfigError::Validation(msg)) => eprintln!("Validation: {msg}"),
/// }
/// ```
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An I/O error occurred reading or writing the config file.
    #[error("I/O error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file contained invalid YAML that could not be parsed.
    #[error("YAML parse error in config: {0}")]
    Parse(#[from] serde_yaml_ng::Error),

    /// A field value failed semantic validation.
    ///
    /// The inner string names the invalid field and why.
    #[error("Config validation error: {0}")]
    Validation(String),
}
