//! VecRAG Core - Domain models, traits, and shared types
//!
//! This crate defines the core abstractions used throughout VecRAG:
//! - Documents, stored points and search results
//! - Ranked citations handed to prompt construction
//! - Common error types
//! - The chat completion trait
//! - Configuration management
//!
//! Author: hephaex@gmail.com

pub mod config;

pub use config::{
    AppConfig, ChatConfig, ChatProvider, ConfigError, EmbeddingConfig, EmbeddingProviderKind,
    EndpointStyle, LoggingConfig, RetrievalConfig, StoreConfig, WriteMode,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Core error types for VecRAG operations
#[derive(Error, Debug)]
pub enum RagError {
    #[error("Embedding backend error: {0}")]
    EmbeddingBackend(String),

    #[error("Vector store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ConfigError> for RagError {
    fn from(err: ConfigError) -> Self {
        RagError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RagError>;

// ============================================================================
// Documents and Points
// ============================================================================

/// Payload key holding the original text of a point
pub const PAYLOAD_TEXT: &str = "text";

/// Payload key holding the character count of the text
pub const PAYLOAD_LENGTH: &str = "length";

/// Payload key holding the document category
pub const PAYLOAD_CATEGORY: &str = "category";

/// Payload key holding the caller-supplied document key
pub const PAYLOAD_KEY: &str = "key";

/// Auxiliary value reported when the payload carries none
pub const MISSING_AUXILIARY: i64 = -1;

/// A logical unit of ingested text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Caller-supplied logical identifier
    pub key: String,

    /// UTF-8 content
    pub text: String,
}

impl Document {
    /// Create a new document
    pub fn new(key: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            text: text.into(),
        }
    }

    /// Number of Unicode scalar values in the text
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Payload attached to a stored point
pub type Payload = HashMap<String, serde_json::Value>;

/// The unit persisted in the vector store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredPoint {
    /// Point identifier; assigned by the store when `None`
    pub id: Option<u64>,

    /// Fixed-length vector matching the collection dimension
    pub vector: Vec<f32>,

    /// Arbitrary payload, always containing `text`
    pub payload: Payload,
}

impl StoredPoint {
    /// Create a point without an id
    pub fn new(vector: Vec<f32>, payload: Payload) -> Self {
        Self {
            id: None,
            vector,
            payload,
        }
    }

    /// Set an explicit id
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    /// Build the standard ingestion payload for a document
    pub fn document_payload(document: &Document, category: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert(PAYLOAD_TEXT.to_string(), document.text.clone().into());
        payload.insert(PAYLOAD_LENGTH.to_string(), document.char_count().into());
        payload.insert(PAYLOAD_CATEGORY.to_string(), category.into());
        payload.insert(PAYLOAD_KEY.to_string(), document.key.clone().into());
        payload
    }
}

/// Distance metric of a collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    Dot,
    Euclid,
}

/// Shape of a collection: name, dimension and metric
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
}

impl CollectionSpec {
    /// Cosine collection with the given dimension
    pub fn cosine(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            metric: DistanceMetric::Cosine,
        }
    }
}

// ============================================================================
// Search and Citation Types
// ============================================================================

/// A single match returned by a similarity search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Point identifier
    pub id: u64,

    /// Similarity score (higher is more similar)
    pub score: f32,

    /// Original payload text, empty if absent
    pub text: String,

    /// Auxiliary numeric payload tag, `-1` if absent
    pub auxiliary: i64,
}

impl SearchResult {
    /// Translate a raw payload into the public result shape
    pub fn from_payload(id: u64, score: f32, payload: &Payload, auxiliary_field: &str) -> Self {
        let text = payload
            .get(PAYLOAD_TEXT)
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let auxiliary = payload
            .get(auxiliary_field)
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f as i64)))
            .unwrap_or(MISSING_AUXILIARY);

        Self {
            id,
            score,
            text,
            auxiliary,
        }
    }
}

/// Citation pairing a 1-based context rank with its point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    /// Rank in the context block, starting at 1
    pub rank: usize,

    /// Cited point id
    pub id: u64,

    /// Similarity score of the cited point
    pub score: f32,
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for chat completion clients
#[async_trait::async_trait]
pub trait ChatClient: Send + Sync {
    /// Send a system instruction plus a user message, return the reply text
    async fn complete(&self, system: &str, user: &str) -> Result<String>;

    /// Get client name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_char_count_counts_scalars() {
        let doc = Document::new("k", "héllo");
        assert_eq!(doc.char_count(), 5);
        assert_eq!(doc.text.len(), 6);
    }

    #[test]
    fn test_document_payload_fields() {
        let doc = Document::new("svc-1", "Qdrant is a vector database");
        let payload = StoredPoint::document_payload(&doc, "demo");

        assert_eq!(payload[PAYLOAD_TEXT], "Qdrant is a vector database");
        assert_eq!(payload[PAYLOAD_LENGTH], 27);
        assert_eq!(payload[PAYLOAD_CATEGORY], "demo");
        assert_eq!(payload[PAYLOAD_KEY], "svc-1");
    }

    #[test]
    fn test_search_result_from_payload_defaults() {
        let payload = Payload::new();
        let result = SearchResult::from_payload(7, 0.5, &payload, "length");

        assert_eq!(result.id, 7);
        assert_eq!(result.text, "");
        assert_eq!(result.auxiliary, MISSING_AUXILIARY);
    }

    #[test]
    fn test_search_result_from_payload_reads_auxiliary() {
        let doc = Document::new("k", "four");
        let payload = StoredPoint::document_payload(&doc, "demo");
        let result = SearchResult::from_payload(1, 0.9, &payload, "length");

        assert_eq!(result.text, "four");
        assert_eq!(result.auxiliary, 4);

        let missing = SearchResult::from_payload(1, 0.9, &payload, "rand_number");
        assert_eq!(missing.auxiliary, -1);
    }

    #[test]
    fn test_non_numeric_auxiliary_falls_back() {
        let mut payload = Payload::new();
        payload.insert("length".to_string(), "long".into());
        let result = SearchResult::from_payload(1, 0.1, &payload, "length");
        assert_eq!(result.auxiliary, MISSING_AUXILIARY);
    }

    #[test]
    fn test_config_error_converts() {
        let err: RagError = ConfigError::MissingRequired("VOCAB_PATH".to_string()).into();
        assert!(matches!(err, RagError::Configuration(_)));
    }
}
