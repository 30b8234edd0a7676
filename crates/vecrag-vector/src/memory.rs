//! In-memory vector store
//!
//! Same collection and search semantics as the Qdrant store, without a
//! server. Used by tests and the CLI's `--in-memory` mode.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use vecrag_core::{
    CollectionSpec, DistanceMetric, Payload, RagError, Result, SearchResult, StoredPoint,
};

use crate::adapter::cosine_similarity;
use crate::id::PointIdGenerator;
use crate::store::{check_dimension, sort_by_score, CollectionLocks, VectorStore};

struct MemoryCollection {
    spec: CollectionSpec,
    points: BTreeMap<u64, (Vec<f32>, Payload)>,
}

/// An in-memory vector store backed by a HashMap of collections
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, MemoryCollection>>,
    ids: PointIdGenerator,
    auxiliary_field: String,
    locks: CollectionLocks,
}

impl InMemoryVectorStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            ids: PointIdGenerator::new(),
            auxiliary_field: vecrag_core::PAYLOAD_LENGTH.to_string(),
            locks: CollectionLocks::new(),
        }
    }

    /// Read the auxiliary result tag from a different payload field
    pub fn with_auxiliary_field(mut self, field: impl Into<String>) -> Self {
        self.auxiliary_field = field.into();
        self
    }

    /// Number of points in a collection, `None` if it does not exist
    pub async fn point_count(&self, collection: &str) -> Option<usize> {
        self.collections
            .read()
            .await
            .get(collection)
            .map(|c| c.points.len())
    }
}

impl Default for InMemoryVectorStore {
    fn default() -> Self {
        Self::new()
    }
}

fn score(metric: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    match metric {
        DistanceMetric::Cosine => cosine_similarity(a, b),
        DistanceMetric::Dot => a.iter().zip(b.iter()).map(|(x, y)| x * y).sum(),
        // Higher is more similar, so report the negated distance
        DistanceMetric::Euclid => -a
            .iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt(),
    }
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        Ok(self.collections.read().await.contains_key(name))
    }

    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()> {
        let mut collections = self.collections.write().await;
        if collections.contains_key(&spec.name) {
            return Err(RagError::StoreUnavailable(format!(
                "Collection {} already exists",
                spec.name
            )));
        }
        collections.insert(
            spec.name.clone(),
            MemoryCollection {
                spec: spec.clone(),
                points: BTreeMap::new(),
            },
        );
        Ok(())
    }

    async fn delete_collection(&self, name: &str) -> Result<()> {
        self.collections.write().await.remove(name);
        Ok(())
    }

    async fn upsert_batch(&self, collection: &str, points: Vec<StoredPoint>) -> Result<Vec<u64>> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).ok_or_else(|| {
            RagError::StoreUnavailable(format!("Collection {collection} not found"))
        })?;

        for point in &points {
            check_dimension(target.spec.dimension, &point.vector)?;
        }

        let ids = points
            .into_iter()
            .map(|point| {
                let id = point.id.unwrap_or_else(|| self.ids.next_id());
                target.points.insert(id, (point.vector, point.payload));
                id
            })
            .collect();

        Ok(ids)
    }

    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(target) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        check_dimension(target.spec.dimension, query_vector)?;

        let mut results: Vec<SearchResult> = target
            .points
            .iter()
            .map(|(id, (vector, payload))| {
                SearchResult::from_payload(
                    *id,
                    score(target.spec.metric, query_vector, vector),
                    payload,
                    &self.auxiliary_field,
                )
            })
            .collect();

        sort_by_score(&mut results);
        results.truncate(limit);
        Ok(results)
    }

    fn name(&self) -> &str {
        "memory"
    }

    fn collection_locks(&self) -> &CollectionLocks {
        &self.locks
    }
}
