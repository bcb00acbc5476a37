//! Port for the structured translation log.
//!
//! Defines the [`TranslationLogger`] trait for recording what the model
//! returned and what was executed for each request.
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures a
//! machine-readable trail (JSONL). Raw model output is written here for
//! diagnostics and never returned to the caller.

use serde_json::Value;

/// A structured translation event for logging.
pub struct TranslationEvent {
    /// Event type identifier (e.g., "completion_received", "query_finalized").
    pub event_type: &'static str,
    /// JSON payload with event-specific data.
    pub payload: Value,
}

impl TranslationEvent {
    pub fn new(event_type: &'static str, payload: Value) -> Self {
        Self {
            event_type,
            payload,
        }
    }
}

/// Port for logging translation events.
///
/// `log` is synchronous and infallible; write failures are ignored so that
/// logging never changes the outcome of a request.
pub trait TranslationLogger: Send + Sync {
    fn log(&self, event: TranslationEvent);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoTranslationLogger;

impl TranslationLogger for NoTranslationLogger {
    fn log(&self, _event: TranslationEvent) {}
}
