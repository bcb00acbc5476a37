//! Utterance value object

use super::error::QueryError;
use serde::{Deserialize, Serialize};

/// Free-text request from the caller (Value Object)
///
/// Carries only the text. The tenant travels separately as a
/// [`TenantId`](super::tenant::TenantId) and is never read from here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    content: String,
}

impl Utterance {
    /// Create a new utterance, rejecting blank text
    pub fn try_new(content: impl Into<String>) -> Result<Self, QueryError> {
        let content = content.into();
        if content.trim().is_empty() {
            Err(QueryError::EmptyUtterance)
        } else {
            Ok(Self { content })
        }
    }

    /// Get the utterance content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Consume and return the inner content
    pub fn into_content(self) -> String {
        self.content
    }
}

impl std::fmt::Display for Utterance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.content)
    }
}
