//! Tenant identity value object

use super::error::QueryError;
use serde::{Deserialize, Serialize};

/// An already-authenticated tenant identifier (Value Object)
///
/// Resolved out-of-band by the authorization layer and passed explicitly
/// through every stage. A `TenantId` is never empty or whitespace-only, so
/// holding one is proof that the tenant precondition was checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TenantId(String);

impl TenantId {
    /// Validate a raw tenant id.
    ///
    /// Fails with [`QueryError::MissingTenant`] when blank. Surrounding
    /// whitespace is not trimmed away: the id is bound verbatim.
    pub fn parse(raw: impl Into<String>) -> Result<Self, QueryError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(QueryError::MissingTenant);
        }
        Ok(Self(raw))
    }

    /// Validate an optional tenant id, as handed over by an auth layer.
    pub fn from_optional(raw: Option<&str>) -> Result<Self, QueryError> {
        raw.map_or(Err(QueryError::MissingTenant), Self::parse)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for TenantId {
    type Error = QueryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<TenantId> for String {
    fn from(value: TenantId) -> Self {
        value.0
    }
}
