//! Configuration for the evqueue event dispatch core.
//!
//! This crate provides configuration loading, saving, validation and default
//! values for the dispatch core. It includes:
//!
//! - Suspend-mode grace timeouts
//! - Idle-time accumulator settings
//! - Platform guards applied to input and input-method events
//! - Long-event diagnostics threshold

pub mod config;
pub mod defaults;
pub mod error;

pub use config::{EventQueueConfig, HEADLESS_ENV_VAR};
pub use error::ConfigError;
