//! Qdrant implementation for vector storage
//!
//! Provides connection management, collection lifecycle and point
//! operations against a Qdrant server over gRPC.
//!
//! Author: hephaex@gmail.com

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    point_id::PointIdOptions, value::Kind, vectors_config, CreateCollectionBuilder, Distance,
    PointId, PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Qdrant, QdrantError};
use tokio::sync::RwLock;
use vecrag_core::{
    CollectionSpec, DistanceMetric, Payload, RagError, Result, SearchResult, StoreConfig,
    StoredPoint,
};

use crate::id::PointIdGenerator;
use crate::store::{check_dimension, sort_by_score, CollectionLocks, VectorStore};

/// Qdrant vector store implementation
pub struct QdrantStore {
    client: Qdrant,
    ids: PointIdGenerator,
    auxiliary_field: String,
    locks: CollectionLocks,
    /// Known dimension per collection, filled on create or first lookup.
    /// Dropped when a write or search against the collection fails, so a
    /// collection recreated elsewhere is looked up again.
    dimensions: RwLock<HashMap<String, usize>>,
}

impl QdrantStore {
    /// Create a new Qdrant connection
    pub fn new(config: &StoreConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.qdrant_url)
            .timeout(Duration::from_secs(config.timeout_secs));

        if let Some(api_key) = &config.qdrant_api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| RagError::Configuration(format!("Qdrant client setup failed: {e}")))?;

        tracing::info!(url = %config.qdrant_url, "Qdrant client configured");

        Ok(Self::from_client(client).with_auxiliary_field(config.auxiliary_field.clone()))
    }

    /// Wrap an already built client
    pub fn from_client(client: Qdrant) -> Self {
        Self {
            client,
            ids: PointIdGenerator::new(),
            auxiliary_field: vecrag_core::PAYLOAD_LENGTH.to_string(),
            locks: CollectionLocks::new(),
            dimensions: RwLock::new(HashMap::new()),
        }
    }

    /// Read the auxiliary result tag from a different payload field
    pub fn with_auxiliary_field(mut self, field: impl Into<String>) -> Self {
        self.auxiliary_field = field.into();
        self
    }

    /// Dimension of a collection, from cache or from the server
    async fn dimension_of(&self, collection: &str) -> Result<Option<usize>> {
        if let Some(dim) = self.dimensions.read().await.get(collection) {
            return Ok(Some(*dim));
        }

        let info = self
            .client
            .collection_info(collection)
            .await
            .map_err(unavailable("Failed to fetch collection info"))?;

        let dimension = info
            .result
            .and_then(|i| i.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config)
            .and_then(|config| match config {
                vectors_config::Config::Params(params) => Some(params.size as usize),
                _ => None,
            });

        if let Some(dim) = dimension {
            self.dimensions
                .write()
                .await
                .insert(collection.to_string(), dim);
        }

        Ok(dimension)
    }

    async fn forget_dimension(&self, collection: &str) {
        self.dimensions.write().await.remove(collection);
    }
}

fn unavailable(context: &'static str) -> impl Fn(QdrantError) -> RagError {
    move |e| RagError::StoreUnavailable(format!("{context}: {e}"))
}

fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Dot => Distance::Dot,
        DistanceMetric::Euclid => Distance::Euclid,
    }
}

fn json_to_qdrant_value(val: serde_json::Value) -> Option<QdrantValue> {
    match val {
        serde_json::Value::Null => None,
        serde_json::Value::Bool(b) => Some(QdrantValue::from(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(QdrantValue::from(i))
            } else {
                n.as_f64().map(QdrantValue::from)
            }
        }
        serde_json::Value::String(s) => Some(QdrantValue::from(s)),
        // Nested structures are stored as their JSON text
        other => Some(QdrantValue::from(other.to_string())),
    }
}

fn qdrant_value_to_json(val: QdrantValue) -> Option<serde_json::Value> {
    match val.kind {
        Some(Kind::NullValue(_)) => Some(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => Some(serde_json::Value::Bool(b)),
        Some(Kind::IntegerValue(i)) => Some(serde_json::Value::Number(i.into())),
        Some(Kind::DoubleValue(f)) => {
            serde_json::Number::from_f64(f).map(serde_json::Value::Number)
        }
        Some(Kind::StringValue(s)) => Some(serde_json::Value::String(s)),
        _ => None,
    }
}

fn payload_to_qdrant(payload: Payload) -> HashMap<String, QdrantValue> {
    payload
        .into_iter()
        .filter_map(|(k, v)| json_to_qdrant_value(v).map(|v| (k, v)))
        .collect()
}

fn payload_from_qdrant(payload: HashMap<String, QdrantValue>) -> Payload {
    payload
        .into_iter()
        .filter_map(|(k, v)| qdrant_value_to_json(v).map(|v| (k, v)))
        .collect()
}

fn point_id_to_u64(id: Option<PointId>) -> Option<u64> {
    match id.and_then(|p| p.point_id_options) {
        Some(PointIdOptions::Num(num)) => Some(num),
        _ => None,
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(unavailable("Failed to check collection"))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        self.client
            .create_collection(
                CreateCollectionBuilder::new(&spec.name).vectors_config(VectorParamsBuilder::new(
                    spec.dimension as u64,
                    to_qdrant_distance(spec.metric),
                )),
            )
            .await
            .map_err(unavailable("Failed to create collection"))?;

        self.dimensions
            .write()
            .await
            .insert(spec.name.clone(), spec.dimension);

        tracing::info!(
            collection = %spec.name,
            dimension = spec.dimension,
            "Collection created"
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.dimensions.write().await.remove(name);
        self.client
            .delete_collection(name)
            .await
            .map_err(unavailable("Failed to delete collection"))?;
        Ok(())
    }

    async fn upsert_batch(&self, collection: &str, points: Vec<StoredPoint>) -> Result<Vec<u64>> {
        if points.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(dimension) = self.dimension_of(collection).await? {
            for point in &points {
                check_dimension(dimension, &point.vector)?;
            }
        }

        let mut ids = Vec::with_capacity(points.len());
        let qdrant_points: Vec<PointStruct> = points
            .into_iter()
            .map(|point| {
                let id = point.id.unwrap_or_else(|| self.ids.next_id());
                ids.push(id);
                PointStruct::new(id, point.vector, payload_to_qdrant(point.payload))
            })
            .collect();

        let upserted = self
            .client
            .upsert_points(UpsertPointsBuilder::new(collection, qdrant_points).wait(true))
            .await;
        if let Err(e) = upserted {
            self.forget_dimension(collection).await;
            return Err(unavailable("Failed to upsert points")(e));
        }

        tracing::debug!(collection, count = ids.len(), "Points upserted");
        Ok(ids)
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        if limit == 0 {
            return Ok(Vec::new());
        }

        if !self.collection_exists(collection).await? {
            tracing::debug!(collection, "Search on missing collection");
            return Ok(Vec::new());
        }

        if let Some(dimension) = self.dimension_of(collection).await? {
            check_dimension(dimension, query_vector)?;
        }

        let response = match self
            .client
            .search_points(
                SearchPointsBuilder::new(collection, query_vector.to_vec(), limit as u64)
                    .with_payload(true),
            )
            .await
        {
            Ok(response) => response,
            Err(e) => {
                self.forget_dimension(collection).await;
                return Err(unavailable("Vector search failed")(e));
            }
        };

        let mut results: Vec<SearchResult> = response
            .result
            .into_iter()
            .filter_map(|point| {
                let id = point_id_to_u64(point.id)?;
                let payload = payload_from_qdrant(point.payload);
                Some(SearchResult::from_payload(
                    id,
                    point.score,
                    &payload,
                    &self.auxiliary_field,
                ))
            })
            .collect();

        sort_by_score(&mut results);
        Ok(results)
    }

    fn name(&self) -> &str {
        "qdrant"
    }

    fn collection_locks(&self) -> &CollectionLocks {
        &self.locks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vecrag_core::Document;

    #[test]
    fn test_payload_roundtrip_keeps_primitives() {
        let doc = Document::new("svc", "Azure Blob Storage");
        let payload = StoredPoint::document_payload(&doc, "demo");

        let restored = payload_from_qdrant(payload_to_qdrant(payload.clone()));
        assert_eq!(restored, payload);
    }

    #[test]
    fn test_null_payload_values_are_dropped() {
        let mut payload = Payload::new();
        payload.insert("gone".to_string(), serde_json::Value::Null);
        payload.insert("ratio".to_string(), serde_json::json!(0.25));

        let converted = payload_to_qdrant(payload);
        assert!(!converted.contains_key("gone"));
        assert!(converted.contains_key("ratio"));
    }

    #[test]
    fn test_point_id_conversion() {
        assert_eq!(point_id_to_u64(Some(PointId::from(17u64))), Some(17));
        assert_eq!(
            point_id_to_u64(Some(PointId::from(
                "1f0a2d3c-0000-4000-8000-000000000000".to_string()
            ))),
            None
        );
        assert_eq!(point_id_to_u64(None), None);
    }

    #[test]
    fn test_distance_mapping() {
        assert_eq!(to_qdrant_distance(DistanceMetric::Cosine), Distance::Cosine);
        assert_eq!(to_qdrant_distance(DistanceMetric::Dot), Distance::Dot);
        assert_eq!(to_qdrant_distance(DistanceMetric::Euclid), Distance::Euclid);
    }

    #[tokio::test]
    async fn test_new_accepts_default_config() {
        let store = QdrantStore::new(&StoreConfig::default()).unwrap();
        assert_eq!(store.name(), "qdrant");
        assert_eq!(store.auxiliary_field, "length");
    }

    fn unreachable_store() -> QdrantStore {
        let config = StoreConfig {
            qdrant_url: "http://127.0.0.1:1".to_string(),
            timeout_secs: 2,
            ..Default::default()
        };
        QdrantStore::new(&config).unwrap()
    }

    #[tokio::test]
    async fn test_zero_limit_search_skips_the_server() {
        let store = unreachable_store();
        let results = store.search("anything", &[0.1, 0.2], 0).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_failed_upsert_forgets_cached_dimension() {
        let store = unreachable_store();
        store
            .dimensions
            .write()
            .await
            .insert("docs".to_string(), 2);

        let point = StoredPoint {
            id: Some(1),
            vector: vec![0.1, 0.2],
            payload: Payload::new(),
        };
        let err = store.upsert_batch("docs", vec![point]).await.unwrap_err();

        assert!(matches!(err, RagError::StoreUnavailable(_)));
        assert!(!store.dimensions.read().await.contains_key("docs"));
    }

    #[tokio::test]
    #[ignore = "requires a running Qdrant server on QDRANT_URL"]
    async fn test_live_recreate_and_search() {
        let config = StoreConfig {
            qdrant_url: std::env::var("QDRANT_URL")
                .unwrap_or_else(|_| "http://localhost:6334".to_string()),
            collection: "vecrag_live_test".to_string(),
            vector_dimension: 4,
            ..Default::default()
        };
        let store = QdrantStore::new(&config).unwrap();
        let spec = CollectionSpec::cosine(&config.collection, 4);

        store.ensure_collection_for_write(&spec).await.unwrap();
        let doc = Document::new("a", "Qdrant is a vector database");
        let id = store
            .upsert(
                &spec.name,
                StoredPoint::new(
                    vec![1.0, 0.0, 0.0, 0.0],
                    StoredPoint::document_payload(&doc, "demo"),
                ),
            )
            .await
            .unwrap();

        let results = store
            .search(&spec.name, &[1.0, 0.0, 0.0, 0.0], 5)
            .await
            .unwrap();
        assert_eq!(results[0].id, id);
        assert_eq!(results[0].text, doc.text);

        store.delete_collection(&spec.name).await.unwrap();
    }
}
