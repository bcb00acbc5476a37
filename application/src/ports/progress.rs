//! Progress notification port
//!
//! Defines the interface for reporting progress of a single translation.

use nlq_domain::SafeQuery;

/// Callback for progress updates during a translation
///
/// Implementations live in the presentation layer (spinner, REPL status).
/// Every method has a no-op default.
pub trait TranslateProgressNotifier: Send + Sync {
    /// Called before the completion request is sent
    fn on_completion_start(&self, _client: &str) {}

    /// Called when the model has answered
    fn on_completion_end(&self, _bytes: usize) {}

    /// Called once the query has been classified and scoped to the tenant
    fn on_query_ready(&self, _query: &SafeQuery) {}

    /// Called when the store returned its documents
    fn on_results(&self, _count: usize) {}

    /// Called when the translation stops with an error
    fn on_failed(&self) {}
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl TranslateProgressNotifier for NoProgress {}
