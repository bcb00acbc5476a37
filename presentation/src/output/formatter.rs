//! Output formatter trait

use crate::config::OutputConfig;
use nlq_application::{TranslateError, TranslateOutput};

/// Trait for rendering translate-and-run results
pub trait OutputFormatter: Send + Sync {
    /// Render the documents (and the query, when `config.explain` is set)
    fn format(&self, output: &TranslateOutput, config: &OutputConfig) -> String;

    /// Render a failure for the end user
    fn format_error(&self, error: &TranslateError) -> String;
}
