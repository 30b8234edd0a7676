//! Vector store trait
//!
//! A store owns collection lifecycle, point id assignment, upsert and
//! cosine similarity search. Implementations: [`crate::QdrantStore`]
//! and [`crate::InMemoryVectorStore`].
//!
//! Author: hephaex@gmail.com

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, OwnedMutexGuard};
use vecrag_core::{CollectionSpec, RagError, Result, SearchResult, StoredPoint};

/// One async write lock per collection name.
///
/// Held across collection preparation and upsert, so writers sharing a
/// store cannot interleave delete, create and upsert on one collection.
#[derive(Debug, Default)]
pub struct CollectionLocks {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CollectionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive write access to `collection`
    pub async fn lock(&self, collection: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(collection.to_string()).or_default())
        };
        lock.lock_owned().await
    }
}

/// Trait for vector database operations
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Check whether a collection exists
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    /// Create a collection with the given dimension and metric
    async fn create_collection(&self, spec: &CollectionSpec) -> Result<()>;

    /// Delete a collection and every point in it
    async fn delete_collection(&self, name: &str) -> Result<()>;

    /// Store points, assigning ids to those without one.
    /// Returns the ids in input order.
    async fn upsert_batch(&self, collection: &str, points: Vec<StoredPoint>) -> Result<Vec<u64>>;

    /// Cosine similarity search, descending score, at most `limit` results.
    /// A missing or empty collection yields no results.
    async fn search(
        &self,
        collection: &str,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>>;

    /// Get backend name for logging
    fn name(&self) -> &str;

    /// Per-collection write locks shared by every writer of this store
    fn collection_locks(&self) -> &CollectionLocks;

    /// Prepare a collection for an ingestion write.
    ///
    /// An existing collection is deleted and recreated, wiping all of its
    /// points, so the stored dimension always equals `spec.dimension`.
    async fn ensure_collection_for_write(&self, spec: &CollectionSpec) -> Result<()> {
        if self.collection_exists(&spec.name).await? {
            tracing::info!(collection = %spec.name, "Recreating existing collection");
            self.delete_collection(&spec.name).await?;
        }
        self.create_collection(spec).await
    }

    /// Create the collection only if it is missing
    async fn ensure_collection(&self, spec: &CollectionSpec) -> Result<()> {
        if !self.collection_exists(&spec.name).await? {
            self.create_collection(spec).await?;
        }
        Ok(())
    }

    /// Store a single point and return its id
    async fn upsert(&self, collection: &str, point: StoredPoint) -> Result<u64> {
        self.upsert_batch(collection, vec![point])
            .await?
            .pop()
            .ok_or_else(|| RagError::StoreUnavailable("Upsert returned no id".to_string()))
    }
}

/// Reject vectors whose length differs from the collection dimension
pub fn check_dimension(expected: usize, vector: &[f32]) -> Result<()> {
    if vector.len() != expected {
        return Err(RagError::DimensionMismatch {
            expected,
            actual: vector.len(),
        });
    }
    Ok(())
}

/// Order results by descending score; ties keep ascending id order
pub fn sort_by_score(results: &mut [SearchResult]) {
    results.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.id.cmp(&b.id))
    });
}
