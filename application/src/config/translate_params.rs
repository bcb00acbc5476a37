//! Translation parameters - use case behavior control.
//!
//! [`TranslateParams`] groups the static parameters that control a
//! [`TranslateAndRunUseCase`](crate::use_cases::translate_and_run::TranslateAndRunUseCase).
//! These are application-layer concerns, not domain policy.

use std::time::Duration;

/// Per-use-case limits.
#[derive(Debug, Clone)]
pub struct TranslateParams {
    /// Upper bound on the completion call. `None` waits as long as the client does.
    pub completion_timeout: Option<Duration>,
    /// Bytes of raw model output kept in tracing diagnostics.
    pub log_preview_bytes: usize,
    /// Whether pipelines may use `$lookup`. The joined collection is not
    /// tenant-scoped.
    pub allow_lookup: bool,
}

impl Default for TranslateParams {
    fn default() -> Self {
        Self {
            completion_timeout: Some(Duration::from_secs(60)),
            log_preview_bytes: 200,
            allow_lookup: true,
        }
    }
}

impl TranslateParams {
    // ==================== Builder Methods ====================

    pub fn with_completion_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.completion_timeout = timeout;
        self
    }

    pub fn with_log_preview_bytes(mut self, bytes: usize) -> Self {
        self.log_preview_bytes = bytes;
        self
    }

    pub fn with_allow_lookup(mut self, allow: bool) -> Self {
        self.allow_lookup = allow;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default() {
        let params = TranslateParams::default();
        assert_eq!(params.completion_timeout, Some(Duration::from_secs(60)));
        assert_eq!(params.log_preview_bytes, 200);
        assert!(params.allow_lookup);
    }

    #[test]
    fn test_builder() {
        let params = TranslateParams::default()
            .with_completion_timeout(None)
            .with_log_preview_bytes(32)
            .with_allow_lookup(false);
        assert!(params.completion_timeout.is_none());
        assert!(!params.allow_lookup);
        assert_eq!(params.log_preview_bytes, 32);
    }
}
