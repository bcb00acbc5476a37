//! Domain error types

use thiserror::Error;

/// Errors raised while turning model output into a tenant-scoped query.
///
/// None of the `Display` strings include the raw model text; it is only
/// carried in [`QueryError::MalformedOutput::raw`] for diagnostics.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Model output could not be parsed as a query: {reason}")]
    MalformedOutput { raw: String, reason: String },

    #[error("Query must include 'collection'")]
    MissingCollection,

    #[error("Tenant context is missing")]
    MissingTenant,

    #[error("Request text cannot be empty")]
    EmptyUtterance,

    #[error("Invalid '{part}' in query: {reason}")]
    InvalidQueryPart { part: &'static str, reason: String },

    #[error("Unsupported pipeline stage at index {index}: {reason}")]
    UnsupportedStage { index: usize, reason: String },
}

impl QueryError {
    pub(crate) fn malformed(raw: &str, reason: impl Into<String>) -> Self {
        QueryError::MalformedOutput {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_part(part: &'static str, reason: impl Into<String>) -> Self {
        QueryError::InvalidQueryPart {
            part,
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported_stage(index: usize, reason: impl Into<String>) -> Self {
        QueryError::UnsupportedStage {
            index,
            reason: reason.into(),
        }
    }

    /// Short machine-readable name, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::MalformedOutput { .. } => "malformed_output",
            QueryError::MissingCollection => "missing_collection",
            QueryError::MissingTenant => "missing_tenant",
            QueryError::EmptyUtterance => "empty_utterance",
            QueryError::InvalidQueryPart { .. } => "invalid_query_part",
            QueryError::UnsupportedStage { .. } => "unsupported_stage",
        }
    }

    /// True when the model produced something we could not turn into a query.
    ///
    /// These surface to the caller as "could not understand".
    pub fn is_unintelligible(&self) -> bool {
        matches!(
            self,
            QueryError::MalformedOutput { .. }
                | QueryError::MissingCollection
                | QueryError::InvalidQueryPart { .. }
                | QueryError::UnsupportedStage { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_display_hides_raw_text() {
        let error = QueryError::malformed("SECRET schema dump", "expected value");
        let shown = error.to_string();
        assert!(!shown.contains("SECRET"));
        let QueryError::MalformedOutput { raw, .. } = &error else {
            panic!("expected MalformedOutput");
        };
        assert_eq!(raw, "SECRET schema dump");
    }

    #[test]
    fn test_missing_tenant_display() {
        assert_eq!(
            QueryError::MissingTenant.to_string(),
            "Tenant context is missing"
        );
    }

    #[test]
    fn test_unintelligible_classification() {
        assert!(QueryError::MissingCollection.is_unintelligible());
        assert!(QueryError::unsupported_stage(0, "x").is_unintelligible());
        assert!(!QueryError::MissingTenant.is_unintelligible());
        assert!(!QueryError::EmptyUtterance.is_unintelligible());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(QueryError::MissingTenant.kind(), "missing_tenant");
        assert_eq!(
            QueryError::invalid_part("limit", "negative").kind(),
            "invalid_query_part"
        );
    }
}
