//! Document store port
//!
//! The backend the finalized query runs against. Collection and field names
//! are the catalog vocabulary; the store interprets filter and stage
//! operators.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// A stored document.
pub type Document = Map<String, Value>;

/// Backend failures. The message is for logs, not for end users.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Collection '{0}' does not exist")]
    UnknownCollection(String),

    #[error("Unsupported operator '{0}'")]
    UnsupportedOperator(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Backend error: {0}")]
    Backend(String),
}

/// Optional parts of a find request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub projection: Option<Map<String, Value>>,
    pub sort: Option<Map<String, Value>>,
    pub limit: Option<u64>,
    pub skip: Option<u64>,
}

/// Port for running finalized queries.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `find` against one collection
    async fn find_many(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    /// Run the ordered stages as an aggregation against one collection
    async fn aggregate(&self, collection: &str, stages: &[Value])
    -> Result<Vec<Document>, StoreError>;
}
