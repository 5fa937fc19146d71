//! Dispatch core configuration.
//!
//! Covers:
//! - `load_from_path` / `save_to_path` / `from_yaml_str` (YAML file I/O)
//! - `validate` (every timeout must be non-zero)
//! - `config_path` (platform config directory helper)
//! - the `EVQUEUE_HEADLESS` environment override

use crate::defaults;
use crate::error::ConfigError;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable that forces headless mode (`1` or `true`).
pub const HEADLESS_ENV_VAR: &str = "EVQUEUE_HEADLESS";

/// Tunables for the event dispatch core.
///
/// All durations are stored in milliseconds so the YAML file stays readable;
/// use the `*_timeout` accessors to get [`Duration`] values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventQueueConfig {
    /// Delay before the first attempt to leave suspend mode.
    #[serde(default = "defaults::suspend_enter_timeout_ms")]
    pub suspend_enter_timeout_ms: u64,

    /// Delay before retrying a suspend exit while a window-open event is
    /// still pending in the native queue.
    #[serde(default = "defaults::suspend_retry_timeout_ms")]
    pub suspend_retry_timeout_ms: u64,

    /// Period of the idle-time accumulator.
    #[serde(default = "defaults::idle_time_counter_interval_ms")]
    pub idle_time_counter_interval_ms: u64,

    /// Disables the idle-time accumulator entirely.
    #[serde(default = "defaults::bool_false")]
    pub headless: bool,

    /// Dispatch calls slower than this are reported at debug level.
    #[serde(default = "defaults::long_event_threshold_ms")]
    pub long_event_threshold_ms: u64,

    /// Drop key and mouse events whose source component is no longer showing.
    #[serde(default = "defaults::bool_true")]
    pub drop_input_from_hidden_components: bool,

    /// Drop input-method events while the key dispatcher waits for the second
    /// keystroke of a chord.
    #[serde(default = "defaults::drop_input_method_during_key_chord")]
    pub drop_input_method_during_key_chord: bool,
}

impl Default for EventQueueConfig {
    fn default() -> Self {
        Self {
            suspend_enter_timeout_ms: defaults::suspend_enter_timeout_ms(),
            suspend_retry_timeout_ms: defaults::suspend_retry_timeout_ms(),
            idle_time_counter_interval_ms: defaults::idle_time_counter_interval_ms(),
            headless: defaults::bool_false(),
            long_event_threshold_ms: defaults::long_event_threshold_ms(),
            drop_input_from_hidden_components: defaults::bool_true(),
            drop_input_method_during_key_chord: defaults::drop_input_method_during_key_chord(),
        }
    }
}

impl EventQueueConfig {
    /// Parse a config from YAML, apply the environment override and validate.
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let mut config: EventQueueConfig = serde_yaml_ng::from_str(contents)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file.
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::info!("Loading event queue config from {:?}", path);
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Load the config at [`Self::config_path`], falling back to defaults
    /// when no file exists yet.
    ///
    /// The underlying [`ConfigError`] can be recovered with
    /// `err.downcast_ref::<ConfigError>()`.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            Self::load_from_path(&path)
                .with_context(|| format!("Failed to load event queue config from {:?}", path))
        } else {
            log::info!("No config at {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Write the configuration as YAML, creating parent directories.
    pub fn save_to_path(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        self.validate()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml_ng::to_string(self)?;
        fs::write(path, yaml)?;
        log::info!("Saved event queue config to {:?}", path);
        Ok(())
    }

    /// Default location of the config file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("evqueue")
            .join("config.yaml")
    }

    /// Reject zero timeouts; a zero-delay alarm would spin the GUI thread.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let fields = [
            ("suspend_enter_timeout_ms", self.suspend_enter_timeout_ms),
            ("suspend_retry_timeout_ms", self.suspend_retry_timeout_ms),
            (
                "idle_time_counter_interval_ms",
                self.idle_time_counter_interval_ms,
            ),
            ("long_event_threshold_ms", self.long_event_threshold_ms),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(ConfigError::Validation(format!("{name} must be > 0")));
            }
        }
        Ok(())
    }

    /// Force headless mode when `EVQUEUE_HEADLESS` is set to `1` or `true`.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(HEADLESS_ENV_VAR)
            && matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true")
        {
            log::debug!("{HEADLESS_ENV_VAR}={value}: idle-time accumulator disabled");
            self.headless = true;
        }
    }

    pub fn suspend_enter_timeout(&self) -> Duration {
        Duration::from_millis(self.suspend_enter_timeout_ms)
    }

    pub fn suspend_retry_timeout(&self) -> Duration {
        Duration::from_millis(self.suspend_retry_timeout_ms)
    }

    pub fn idle_time_counter_interval(&self) -> Duration {
        Duration::from_millis(self.idle_time_counter_interval_ms)
    }

    pub fn long_event_threshold(&self) -> Duration {
        Duration::from_millis(self.long_event_threshold_ms)
    }
}
