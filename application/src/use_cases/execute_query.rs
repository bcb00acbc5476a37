//! Query executor
//!
//! Runs a [`SafeQuery`] against a [`DocumentStore`]. Only tenant-scoped
//! queries are accepted: there is no way to hand this type a bare
//! [`QueryShape`].

use crate::ports::document_store::{Document, DocumentStore, FindOptions, StoreError};
use nlq_domain::{QueryShape, SafeQuery};
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

pub struct QueryExecutor {
    store: Arc<dyn DocumentStore>,
}

impl QueryExecutor {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Execute the query and return every resulting document.
    pub async fn execute(&self, query: &SafeQuery) -> Result<Vec<Document>, StoreError> {
        match query.shape() {
            QueryShape::Filter(find) => {
                let options = FindOptions {
                    projection: find.projection.clone(),
                    sort: find.sort.clone(),
                    limit: find.limit,
                    skip: find.skip,
                };
                debug!(collection = %find.collection, "find");
                self.store
                    .find_many(&find.collection, &find.filter, &options)
                    .await
            }
            QueryShape::Pipeline(pipeline) => {
                let stages: Vec<Value> = pipeline.stages.iter().map(|s| s.to_value()).collect();
                debug!(collection = %pipeline.collection, stages = stages.len(), "aggregate");
                self.store.aggregate(&pipeline.collection, &stages).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use nlq_domain::{TenantId, TenantIsolationEnforcer, classify, parse_query_document};
    use serde_json::{Map, json};
    use std::sync::Mutex;

    #[derive(Debug, PartialEq)]
    enum Call {
        Find {
            collection: String,
            filter: Value,
            options: FindOptions,
        },
        Aggregate {
            collection: String,
            stages: Vec<Value>,
        },
    }

    #[derive(Default)]
    struct RecordingStore {
        calls: Mutex<Vec<Call>>,
        fail_with: Option<StoreError>,
    }

    #[async_trait]
    impl DocumentStore for RecordingStore {
        async fn find_many(
            &self,
            collection: &str,
            filter: &Map<String, Value>,
            options: &FindOptions,
        ) -> Result<Vec<Document>, StoreError> {
            self.calls.lock().unwrap().push(Call::Find {
                collection: collection.to_string(),
                filter: Value::Object(filter.clone()),
                options: options.clone(),
            });
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(vec![]),
            }
        }

        async fn aggregate(
            &self,
            collection: &str,
            stages: &[Value],
        ) -> Result<Vec<Document>, StoreError> {
            self.calls.lock().unwrap().push(Call::Aggregate {
                collection: collection.to_string(),
                stages: stages.to_vec(),
            });
            match &self.fail_with {
                Some(e) => Err(e.clone()),
                None => Ok(vec![]),
            }
        }
    }

    fn safe(raw: &str, tenant: &str) -> SafeQuery {
        let shape = classify(parse_query_document(raw).unwrap()).unwrap();
        TenantIsolationEnforcer::default().enforce(shape, &TenantId::parse(tenant).unwrap())
    }

    #[tokio::test]
    async fn test_filter_query_becomes_find() {
        let store = Arc::new(RecordingStore::default());
        let executor = QueryExecutor::new(store.clone());

        let query = safe(
            r#"{"collection":"product","filter":{"name":"Soap"},"sort":{"name":1},"limit":5,"skip":2,"projection":{"name":1}}"#,
            "t1",
        );
        executor.execute(&query).await.unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            Call::Find {
                collection: "product".into(),
                filter: json!({"name": "Soap", "tenant_id": "t1"}),
                options: FindOptions {
                    projection: json!({"name": 1}).as_object().cloned(),
                    sort: json!({"name": 1}).as_object().cloned(),
                    limit: Some(5),
                    skip: Some(2),
                },
            }
        );
    }

    #[tokio::test]
    async fn test_pipeline_query_becomes_aggregate() {
        let store = Arc::new(RecordingStore::default());
        let executor = QueryExecutor::new(store.clone());

        let query = safe(
            r#"{"collection":"transaction","pipeline":[{"$group":{"_id":null,"total":{"$sum":"$net_amount"}}}]}"#,
            "t9",
        );
        executor.execute(&query).await.unwrap();

        let calls = store.calls.lock().unwrap();
        assert_eq!(
            calls[0],
            Call::Aggregate {
                collection: "transaction".into(),
                stages: vec![
                    json!({"$match": {"tenant_id": "t9"}}),
                    json!({"$group": {"_id": null, "total": {"$sum": "$net_amount"}}}),
                ],
            }
        );
    }

    #[tokio::test]
    async fn test_backend_error_propagates() {
        let store = Arc::new(RecordingStore {
            fail_with: Some(StoreError::UnknownCollection("nope".into())),
            ..Default::default()
        });
        let executor = QueryExecutor::new(store);

        let err = executor
            .execute(&safe(r#"{"collection":"nope"}"#, "t1"))
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UnknownCollection("nope".into()));
    }
}
