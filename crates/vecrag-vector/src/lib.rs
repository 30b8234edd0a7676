//! VecRAG Vector - Embedding generation and vector storage
//!
//! Provides the embedding backends, fixed-dimension vector
//! normalization, and the vector store abstraction over Qdrant
//! (plus an in-memory store with identical semantics).
//!
//! Author: hephaex@gmail.com

pub mod adapter;
pub mod embedding;
pub mod id;
pub mod local;
pub mod memory;
pub mod qdrant_store;
pub mod store;

pub use adapter::{cosine_similarity, resize};
pub use embedding::{
    create_embedding_provider, EmbeddingProvider, LocalServerProvider, RemoteHostedProvider,
};
pub use id::PointIdGenerator;
pub use local::{
    InferenceModel, LocalInferenceProvider, ModelLoader, ModelRegistry, TokenizedInput,
    Vocabulary, WordPieceTokenizer,
};
pub use memory::InMemoryVectorStore;
pub use qdrant_store::QdrantStore;
pub use store::{CollectionLocks, VectorStore};
