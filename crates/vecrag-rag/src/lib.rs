//! VecRAG RAG - Retrieval orchestration and answer generation
//!
//! This crate drives the retrieval flow:
//! - Ingestion: text → embedding → fixed-dimension point → upsert
//! - Query: text → embedding → similarity search → ranked results
//!
//! Ranked results become a numbered context block, which the
//! [`RagPipeline`] hands to a chat model together with the question.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Instant;

use vecrag_core::{
    AppConfig, CollectionSpec, Document, RagError, Result, SearchResult, StoredPoint, WriteMode,
};
use vecrag_vector::store::sort_by_score;
use vecrag_vector::{resize, EmbeddingProvider, VectorStore};

pub mod context;
pub mod corpus;
pub mod llm;
pub mod pipeline;

pub use context::{RankedContext, RankedEntry, RetrievalOutcome};
pub use corpus::{cloud_services, CloudService};
pub use llm::{create_chat_client, OllamaChatClient, OpenAiChatClient};
pub use pipeline::{Answer, PromptBuilder, RagPipeline, NO_CONTEXT_ANSWER};

// ============================================================================
// Configuration
// ============================================================================

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Target collection
    pub collection: String,

    /// Collection dimension; every embedding is resized to it
    pub dimension: usize,

    /// How ingestion treats an existing collection
    pub write_mode: WriteMode,

    /// Category written into each payload
    pub category: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            collection: "vecrag_demo".to_string(),
            dimension: 1536,
            write_mode: WriteMode::Recreate,
            category: "demo".to_string(),
        }
    }
}

impl OrchestratorConfig {
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            collection: config.store.collection.clone(),
            dimension: config.store.vector_dimension,
            write_mode: config.store.write_mode,
            category: config.retrieval.category.clone(),
        }
    }

    fn collection_spec(&self) -> CollectionSpec {
        CollectionSpec::cosine(self.collection.clone(), self.dimension)
    }
}

// ============================================================================
// Retrieval Orchestrator
// ============================================================================

/// Drives ingestion and query against one collection
pub struct RetrievalOrchestrator {
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    config: OrchestratorConfig,
}

impl RetrievalOrchestrator {
    /// Create a new orchestrator
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn VectorStore>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            embedder,
            store,
            config,
        }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    async fn embed_resized(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.embedder.embed(text).await?;
        tracing::debug!(
            provider = self.embedder.name(),
            raw_dim = vector.len(),
            target_dim = self.config.dimension,
            "Embedding generated"
        );
        Ok(resize(vector, self.config.dimension))
    }

    async fn prepare_collection(&self) -> Result<()> {
        let spec = self.config.collection_spec();
        match self.config.write_mode {
            WriteMode::Recreate => self.store.ensure_collection_for_write(&spec).await,
            WriteMode::Incremental => self.store.ensure_collection(&spec).await,
        }
    }

    /// Ingest a single document and return its point id.
    ///
    /// In [`WriteMode::Recreate`] this wipes every previously stored point.
    pub async fn ingest(&self, document: &Document) -> Result<u64> {
        let vector = self.embed_resized(&document.text).await?;
        let payload = StoredPoint::document_payload(document, &self.config.category);

        let _guard = self
            .store
            .collection_locks()
            .lock(&self.config.collection)
            .await;
        self.prepare_collection().await?;
        let id = self
            .store
            .upsert(&self.config.collection, StoredPoint::new(vector, payload))
            .await?;

        tracing::info!(
            collection = %self.config.collection,
            key = %document.key,
            id,
            "Document ingested"
        );
        Ok(id)
    }

    /// Ingest several documents with a single collection preparation.
    ///
    /// Every document is embedded before the store is touched; the first
    /// failure aborts the whole batch.
    pub async fn ingest_batch(&self, documents: &[Document]) -> Result<Vec<u64>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != documents.len() {
            return Err(RagError::EmbeddingBackend(format!(
                "{} returned {} embeddings for {} texts",
                self.embedder.name(),
                vectors.len(),
                documents.len()
            )));
        }
        tracing::debug!(
            provider = self.embedder.name(),
            count = vectors.len(),
            target_dim = self.config.dimension,
            "Batch embeddings generated"
        );

        let points: Vec<StoredPoint> = documents
            .iter()
            .zip(vectors)
            .map(|(document, vector)| {
                StoredPoint::new(
                    resize(vector, self.config.dimension),
                    StoredPoint::document_payload(document, &self.config.category),
                )
            })
            .collect();

        let _guard = self
            .store
            .collection_locks()
            .lock(&self.config.collection)
            .await;
        self.prepare_collection().await?;
        let ids = self
            .store
            .upsert_batch(&self.config.collection, points)
            .await?;

        tracing::info!(
            collection = %self.config.collection,
            count = ids.len(),
            "Batch ingested"
        );
        Ok(ids)
    }

    /// Search the collection for the texts most similar to `text`.
    ///
    /// Results scoring below `min_score` are dropped; the rest are in
    /// descending score order.
    pub async fn query(
        &self,
        text: &str,
        limit: usize,
        min_score: Option<f32>,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let vector = self.embed_resized(text).await?;

        let mut results = self
            .store
            .search(&self.config.collection, &vector, limit)
            .await?;
        let found = results.len();

        if let Some(min) = min_score {
            results.retain(|r| r.score >= min);
        }
        sort_by_score(&mut results);

        tracing::info!(
            collection = %self.config.collection,
            found,
            kept = results.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Query completed"
        );
        Ok(results)
    }

    /// Query and shape the results into a ranked context
    pub async fn retrieve(
        &self,
        text: &str,
        limit: usize,
        min_score: Option<f32>,
    ) -> Result<RetrievalOutcome> {
        let results = self.query(text, limit, min_score).await?;
        Ok(RetrievalOutcome::from_results(results))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_config_from_app_config() {
        let mut app = AppConfig::default();
        app.store.collection = "docs".to_string();
        app.store.vector_dimension = 384;
        app.store.write_mode = WriteMode::Incremental;
        app.retrieval.category = "faq".to_string();

        let config = OrchestratorConfig::from_app_config(&app);
        assert_eq!(config.collection, "docs");
        assert_eq!(config.dimension, 384);
        assert_eq!(config.write_mode, WriteMode::Incremental);
        assert_eq!(config.category, "faq");
    }

    #[test]
    fn test_default_config_matches_app_defaults() {
        let from_app = OrchestratorConfig::from_app_config(&AppConfig::default());
        let default = OrchestratorConfig::default();
        assert_eq!(from_app.collection, default.collection);
        assert_eq!(from_app.dimension, default.dimension);
        assert_eq!(from_app.write_mode, default.write_mode);
    }

    #[test]
    fn test_collection_spec_is_cosine() {
        let spec = OrchestratorConfig::default().collection_spec();
        assert_eq!(spec.dimension, 1536);
        assert_eq!(spec.metric, vecrag_core::DistanceMetric::Cosine);
    }
}
