//! Typed error types for the dispatch core.
//!
//! Registration misuse is reported through [`EventQueueError`]. Native
//! delivery reports through [`DeliveryError`], of which only the
//! cooperative-cancellation signal ever escapes `dispatch`, as [`Cancelled`].

use thiserror::Error;

/// Cooperative cancellation raised by an event recipient.
///
/// Never swallowed by the core: it always propagates to whoever called
/// `dispatch`, `flush_queue` or `pump_events_for_hierarchy`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("event processing was cancelled")]
pub struct Cancelled;

/// Failure returned by the native queue's own delivery of an event.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The recipient asked for the current operation to be abandoned.
    #[error("event processing was cancelled")]
    Cancelled,

    /// Any other failure; logged and swallowed by the core.
    #[error(transparent)]
    Failed(#[from] anyhow::Error),
}

impl From<Cancelled> for DeliveryError {
    fn from(_: Cancelled) -> Self {
        DeliveryError::Cancelled
    }
}

/// Errors reported by the listener registries and the dispatch loop.
#[derive(Debug, Error)]
pub enum EventQueueError {
    /// The idle listener is already registered; unregister it first.
    #[error("idle listener '{0}' is already registered")]
    DuplicateListener(String),

    /// The listener was never registered or has already been removed.
    #[error("unknown listener '{0}'")]
    UnknownListener(String),

    /// Idle timeouts must be non-zero.
    #[error("idle listener '{0}' needs a non-zero timeout")]
    InvalidTimeout(String),

    /// Default delivery of an event failed. Logged, never returned from
    /// `dispatch`.
    #[error("Error during dispatching of {event}: {source}")]
    Dispatch {
        /// Diagnostic description of the offending event.
        event: String,
        #[source]
        source: anyhow::Error,
    },
}
