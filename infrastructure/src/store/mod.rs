//! In-memory [`DocumentStore`] implementation.
//!
//! Collections are vectors of JSON documents behind a `std::sync::RwLock`.
//! Filters, projections, sorts and aggregation stages are evaluated by the
//! submodules; anything they don't understand fails with
//! [`StoreError::UnsupportedOperator`] instead of being ignored.

mod cursor;
mod expr;
mod matcher;
mod pipeline;
mod value;

use async_trait::async_trait;
use cursor::{project, sort_documents};
use matcher::matches;
use nlq_application::{Document, DocumentStore, FindOptions, StoreError};
use nlq_domain::SchemaCatalog;
use pipeline::{CollectionSource, run_pipeline};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use tracing::{debug, info};

type Collections = HashMap<String, Vec<Document>>;

impl CollectionSource for Collections {
    fn documents(&self, collection: &str) -> Option<&[Document]> {
        self.get(collection).map(Vec::as_slice)
    }
}

/// In-memory document store, seeded from JSON.
pub struct InMemoryDocumentStore {
    collections: RwLock<Collections>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
        }
    }

    /// Empty store with one collection per catalog entry.
    pub fn for_catalog(catalog: &SchemaCatalog) -> Self {
        let store = Self::new();
        store.ensure_collections(catalog.collection_names());
        store
    }

    /// Parse `{"collection": [documents...]}`.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| StoreError::Backend(format!("seed data is not valid JSON: {}", e)))?;
        let Value::Object(root) = value else {
            return Err(StoreError::Backend(
                "seed data must be an object of collections".to_string(),
            ));
        };

        let store = Self::new();
        for (name, docs) in root {
            let Value::Array(items) = docs else {
                return Err(StoreError::Backend(format!(
                    "seed collection '{}' must be an array",
                    name
                )));
            };
            let mut documents = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                match item {
                    Value::Object(doc) => documents.push(doc),
                    _ => {
                        return Err(StoreError::Backend(format!(
                            "seed collection '{}': entry {} is not an object",
                            name, i
                        )));
                    }
                }
            }
            store.insert_many(&name, documents);
        }
        Ok(store)
    }

    /// Load seed data from a JSON file.
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Backend(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_json_str(&json)?;
        info!(
            "Loaded {} documents from {}",
            store.document_count(),
            path.display()
        );
        Ok(store)
    }

    /// Create any missing collections, leaving existing ones untouched.
    pub fn ensure_collections<'a>(&self, names: impl IntoIterator<Item = &'a str>) {
        if let Ok(mut collections) = self.collections.write() {
            for name in names {
                collections.entry(name.to_string()).or_default();
            }
        }
    }

    /// Append documents to a collection, creating it if needed.
    pub fn insert_many(&self, collection: &str, docs: Vec<Document>) {
        if let Ok(mut collections) = self.collections.write() {
            collections
                .entry(collection.to_string())
                .or_default()
                .extend(docs);
        }
    }

    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .collections
            .read()
            .map(|c| c.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    pub fn document_count(&self) -> usize {
        self.collections
            .read()
            .map(|c| c.values().map(Vec::len).sum())
            .unwrap_or(0)
    }

    fn read(&self) -> Result<std::sync::RwLockReadGuard<'_, Collections>, StoreError> {
        self.collections
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".to_string()))
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find_many(
        &self,
        collection: &str,
        filter: &Map<String, Value>,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        let docs = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?;

        let mut found = Vec::new();
        for doc in docs {
            if matches(doc, filter)? {
                found.push(doc.clone());
            }
        }
        drop(collections);

        if let Some(sort) = &options.sort {
            sort_documents(&mut found, sort)?;
        }
        let skip = options.skip.unwrap_or(0) as usize;
        // limit 0 means no limit
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(n) => n as usize,
        };
        let page = found.into_iter().skip(skip).take(limit);

        let result = match &options.projection {
            Some(projection) if !projection.is_empty() => page
                .map(|doc| project(&doc, projection))
                .collect::<Result<Vec<_>, _>>()?,
            _ => page.collect(),
        };
        debug!(collection, count = result.len(), "find_many");
        Ok(result)
    }

    async fn aggregate(
        &self,
        collection: &str,
        stages: &[Value],
    ) -> Result<Vec<Document>, StoreError> {
        let collections = self.read()?;
        let docs = collections
            .get(collection)
            .ok_or_else(|| StoreError::UnknownCollection(collection.to_string()))?
            .clone();
        let result = run_pipeline(docs, stages, &*collections)?;
        debug!(collection, count = result.len(), "aggregate");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SEED: &str = r#"{
        "product": [
            {"_id": "p1", "tenant_id": "t1", "name": "Soap", "remaining_quantity": 4, "latest_unit_price": 1.2},
            {"_id": "p2", "tenant_id": "t1", "name": "Tea", "remaining_quantity": 40, "latest_unit_price": 3.0},
            {"_id": "p3", "tenant_id": "t1", "name": "Rice", "remaining_quantity": 9, "latest_unit_price": 2.0},
            {"_id": "p4", "tenant_id": "t2", "name": "Soap", "remaining_quantity": 1, "latest_unit_price": 1.1}
        ],
        "supplier": []
    }"#;

    fn store() -> InMemoryDocumentStore {
        InMemoryDocumentStore::from_json_str(SEED).unwrap()
    }

    fn filter(v: Value) -> Map<String, Value> {
        v.as_object().unwrap().clone()
    }

    fn ids(docs: &[Document]) -> Vec<&str> {
        docs.iter().map(|d| d["_id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_find_low_stock_for_tenant() {
        let docs = store()
            .find_many(
                "product",
                &filter(json!({"remaining_quantity": {"$lt": 10}, "tenant_id": "t1"})),
                &FindOptions::default(),
            )
            .await
            .unwrap();
        assert_eq!(ids(&docs), vec!["p1", "p3"]);
    }

    #[tokio::test]
    async fn test_find_with_options() {
        let options = FindOptions {
            projection: Some(filter(json!({"name": 1, "_id": 0}))),
            sort: Some(filter(json!({"remaining_quantity": -1}))),
            limit: Some(2),
            skip: Some(1),
        };
        let docs = store()
            .find_many("product", &filter(json!({"tenant_id": "t1"})), &options)
            .await
            .unwrap();
        let docs: Vec<Value> = docs.into_iter().map(Value::Object).collect();
        assert_eq!(docs, vec![json!({"name": "Rice"}), json!({"name": "Soap"})]);
    }

    #[tokio::test]
    async fn test_aggregate() {
        let docs = store()
            .aggregate(
                "product",
                &[
                    json!({"$match": {"tenant_id": "t1"}}),
                    json!({"$group": {"_id": null, "stock": {"$sum": "$remaining_quantity"}}}),
                ],
            )
            .await
            .unwrap();
        assert_eq!(Value::Object(docs[0].clone()), json!({"_id": null, "stock": 53}));
    }

    #[tokio::test]
    async fn test_unknown_collection() {
        let store = store();
        assert_eq!(
            store
                .find_many("ghost", &Map::new(), &FindOptions::default())
                .await,
            Err(StoreError::UnknownCollection("ghost".into()))
        );
        assert_eq!(
            store.aggregate("ghost", &[]).await,
            Err(StoreError::UnknownCollection("ghost".into()))
        );
    }

    #[tokio::test]
    async fn test_empty_collection_exists() {
        let docs = store()
            .find_many("supplier", &Map::new(), &FindOptions::default())
            .await
            .unwrap();
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_bad_operator_fails() {
        let err = store()
            .find_many(
                "product",
                &filter(json!({"name": {"$near": [0, 0]}})),
                &FindOptions::default(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::UnsupportedOperator("$near".into()));
    }

    #[test]
    fn test_for_catalog_creates_every_collection() {
        let catalog = SchemaCatalog::inventory();
        let store = InMemoryDocumentStore::for_catalog(&catalog);
        let names = store.collection_names();
        assert_eq!(names.len(), catalog.collections.len());
        assert!(names.contains(&"transaction_item".to_string()));
        assert_eq!(store.document_count(), 0);
    }

    #[test]
    fn test_seed_validation() {
        assert!(InMemoryDocumentStore::from_json_str("[]").is_err());
        assert!(InMemoryDocumentStore::from_json_str(r#"{"product": {}}"#).is_err());
        assert!(InMemoryDocumentStore::from_json_str(r#"{"product": [1]}"#).is_err());
        assert!(InMemoryDocumentStore::from_json_str("{").is_err());
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.json");
        std::fs::write(&path, SEED).unwrap();

        let store = InMemoryDocumentStore::load_file(&path).unwrap();
        assert_eq!(store.document_count(), 4);
        store.ensure_collections(["product", "invoice"]);
        assert_eq!(store.document_count(), 4);
        assert_eq!(store.collection_names(), vec!["invoice", "product", "supplier"]);

        assert!(InMemoryDocumentStore::load_file(dir.path().join("missing.json")).is_err());
    }
}
