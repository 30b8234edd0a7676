//! VecRAG Configuration Management
//!
//! Handles configuration from environment variables and config files
//! with sensible defaults for a local development setup
//! (Ollama on 11434, Qdrant gRPC on 6334).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Embedding backend configuration
    pub embedding: EmbeddingConfig,

    /// Vector store configuration
    pub store: StoreConfig,

    /// Retrieval configuration
    pub retrieval: RetrievalConfig,

    /// Chat completion configuration
    pub chat: ChatConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        Self::from_toml_str(&content).map_err(|message| ConfigError::ParseError { path, message })
    }

    fn from_toml_str(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| e.to_string())
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        self.apply_env()?;
        Ok(self)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        // Embedding
        if let Ok(provider) = std::env::var("EMBEDDING_PROVIDER") {
            self.embedding.provider = provider.parse()?;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(url) = std::env::var("EMBEDDING_URL") {
            self.embedding.server_url = url;
        }
        if let Ok(style) = std::env::var("EMBEDDING_ENDPOINT_STYLE") {
            self.embedding.endpoint_style = style.parse()?;
        }
        if let Ok(token) = std::env::var("HF_API_TOKEN") {
            self.embedding.hosted_api_token = Some(token);
        }
        if let Ok(endpoint) = std::env::var("HF_ENDPOINT") {
            self.embedding.hosted_endpoint = endpoint;
        }
        if let Ok(path) = std::env::var("MODEL_PATH") {
            self.embedding.model_path = Some(PathBuf::from(path));
        }
        if let Ok(path) = std::env::var("VOCAB_PATH") {
            self.embedding.vocab_path = Some(PathBuf::from(path));
        }

        // Qdrant
        if let Ok(url) = std::env::var("QDRANT_URL") {
            self.store.qdrant_url = url;
        }
        if let Ok(key) = std::env::var("QDRANT_API_KEY") {
            self.store.qdrant_api_key = Some(key);
        }
        if let Ok(name) = std::env::var("QDRANT_COLLECTION") {
            self.store.collection = name;
        }
        if let Ok(dim) = std::env::var("VECTOR_DIMENSION") {
            self.store.vector_dimension = dim.parse().map_err(|_| ConfigError::InvalidValue {
                key: "VECTOR_DIMENSION".to_string(),
                value: dim,
            })?;
        }
        if let Ok(mode) = std::env::var("WRITE_MODE") {
            self.store.write_mode = mode.parse()?;
        }

        // Chat
        if let Ok(provider) = std::env::var("CHAT_PROVIDER") {
            self.chat.provider = provider.parse()?;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            self.chat.openai_api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OLLAMA_URL") {
            self.chat.ollama_url = url;
        }
        if let Ok(model) = std::env::var("CHAT_MODEL") {
            self.chat.model = model;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            self.logging.json_format = matches!(json.as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Check cross-field requirements before wiring components
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.vector_dimension == 0 {
            return Err(ConfigError::InvalidValue {
                key: "VECTOR_DIMENSION".to_string(),
                value: "0".to_string(),
            });
        }

        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::MissingRequired("QDRANT_COLLECTION".to_string()));
        }

        match self.embedding.provider {
            EmbeddingProviderKind::Local => {
                if self.embedding.model_path.is_none() {
                    return Err(ConfigError::MissingRequired("MODEL_PATH".to_string()));
                }
                if self.embedding.vocab_path.is_none() {
                    return Err(ConfigError::MissingRequired("VOCAB_PATH".to_string()));
                }
            }
            EmbeddingProviderKind::Hosted => {
                if self.embedding.hosted_api_token.is_none() {
                    return Err(ConfigError::MissingRequired("HF_API_TOKEN".to_string()));
                }
            }
            EmbeddingProviderKind::Server => {}
        }

        Ok(())
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which backend produces embeddings
    pub provider: EmbeddingProviderKind,

    /// Model name sent to the local server
    pub model: String,

    /// Local embedding server base URL
    pub server_url: String,

    /// Request/response flavour of the local server
    pub endpoint_style: EndpointStyle,

    /// Hosted inference endpoint (full model URL)
    pub hosted_endpoint: String,

    /// Bearer token for the hosted endpoint
    pub hosted_api_token: Option<String>,

    /// Path to the local inference model
    pub model_path: Option<PathBuf>,

    /// Path to the newline-delimited vocabulary
    pub vocab_path: Option<PathBuf>,

    /// HTTP request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Server,
            model: "phi4".to_string(),
            server_url: "http://localhost:11434".to_string(),
            endpoint_style: EndpointStyle::Ollama,
            hosted_endpoint:
                "https://api-inference.huggingface.co/models/sentence-transformers/all-MiniLM-L6-v2"
                    .to_string(),
            hosted_api_token: None,
            model_path: None,
            vocab_path: None,
            timeout_secs: 60,
        }
    }
}

/// Supported embedding backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// In-process tokenizer and inference model
    Local,
    /// Local HTTP embedding server (Ollama and compatibles)
    Server,
    /// Remote hosted inference API
    Hosted,
}

impl std::str::FromStr for EmbeddingProviderKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" | "onnx" => Ok(Self::Local),
            "server" | "ollama" => Ok(Self::Server),
            "hosted" | "huggingface" | "hf" => Ok(Self::Hosted),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Request/response flavour of a local embedding server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStyle {
    /// `POST /api/embeddings` with `{model, prompt}`
    Ollama,
    /// `POST /embeddings` with `{model, input}`
    OpenAi,
}

impl EndpointStyle {
    /// Request path for this flavour
    pub fn path(&self) -> &'static str {
        match self {
            Self::Ollama => "/api/embeddings",
            Self::OpenAi => "/embeddings",
        }
    }
}

impl std::str::FromStr for EndpointStyle {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" | "prompt" => Ok(Self::Ollama),
            "openai" | "input" => Ok(Self::OpenAi),
            _ => Err(ConfigError::InvalidValue {
                key: "EMBEDDING_ENDPOINT_STYLE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Vector store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Qdrant gRPC URL
    pub qdrant_url: String,

    /// Qdrant API key
    pub qdrant_api_key: Option<String>,

    /// Collection name
    pub collection: String,

    /// Collection dimension; every embedding is resized to it
    pub vector_dimension: usize,

    /// Collection write policy
    pub write_mode: WriteMode,

    /// Payload field reported as the auxiliary tag of a result
    pub auxiliary_field: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            qdrant_url: "http://localhost:6334".to_string(),
            qdrant_api_key: None,
            collection: "vecrag_demo".to_string(),
            vector_dimension: 1536,
            write_mode: WriteMode::Recreate,
            auxiliary_field: "length".to_string(),
            timeout_secs: 30,
        }
    }
}

/// How ingestion treats an existing collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    /// Drop and recreate the collection before writing
    #[default]
    Recreate,
    /// Create if missing, then upsert additively
    Incremental,
}

impl std::str::FromStr for WriteMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "recreate" | "fresh" => Ok(Self::Recreate),
            "incremental" | "append" => Ok(Self::Incremental),
            _ => Err(ConfigError::InvalidValue {
                key: "WRITE_MODE".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Default number of results per query
    pub top_k: usize,

    /// Default minimum score; results below it are dropped
    pub min_score: Option<f32>,

    /// Category written into each ingested payload
    pub category: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_score: None,
            category: "demo".to_string(),
        }
    }
}

/// Chat completion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Chat provider to use
    pub provider: ChatProvider,

    /// OpenAI API key
    pub openai_api_key: Option<String>,

    /// OpenAI API base URL (for compatible APIs)
    pub openai_base_url: Option<String>,

    /// Ollama server URL
    pub ollama_url: String,

    /// Model name to use
    pub model: String,

    /// Maximum tokens for completion
    pub max_tokens: u32,

    /// Temperature for generation
    pub temperature: f32,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: ChatProvider::Ollama,
            openai_api_key: None,
            openai_base_url: None,
            ollama_url: "http://localhost:11434".to_string(),
            model: "phi4".to_string(),
            max_tokens: 1024,
            temperature: 0.1,
            timeout_secs: 120,
        }
    }
}

/// Supported chat providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatProvider {
    OpenAI,
    Ollama,
}

impl std::str::FromStr for ChatProvider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::OpenAI),
            "ollama" => Ok(Self::Ollama),
            _ => Err(ConfigError::InvalidValue {
                key: "CHAT_PROVIDER".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,

    /// Include file/line in logs
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            include_location: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.store.vector_dimension, 1536);
        assert_eq!(config.store.write_mode, WriteMode::Recreate);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Server);
        assert_eq!(config.store.auxiliary_field, "length");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_provider_parse() {
        assert_eq!(
            "ollama".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::Server
        );
        assert_eq!(
            "HuggingFace".parse::<EmbeddingProviderKind>().unwrap(),
            EmbeddingProviderKind::Hosted
        );
        assert!("invalid".parse::<EmbeddingProviderKind>().is_err());
        assert_eq!("openai".parse::<ChatProvider>().unwrap(), ChatProvider::OpenAI);
    }

    #[test]
    fn test_write_mode_parse() {
        assert_eq!("incremental".parse::<WriteMode>().unwrap(), WriteMode::Incremental);
        assert_eq!("Recreate".parse::<WriteMode>().unwrap(), WriteMode::Recreate);
        assert!("sometimes".parse::<WriteMode>().is_err());
    }

    #[test]
    fn test_endpoint_style_path() {
        assert_eq!(EndpointStyle::Ollama.path(), "/api/embeddings");
        assert_eq!(EndpointStyle::OpenAi.path(), "/embeddings");
    }

    #[test]
    fn test_validate_local_requires_paths() {
        let mut config = AppConfig::default();
        config.embedding.provider = EmbeddingProviderKind::Local;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingRequired(ref key)) if key == "MODEL_PATH"
        ));

        config.embedding.model_path = Some(PathBuf::from("model.onnx"));
        config.embedding.vocab_path = Some(PathBuf::from("vocab.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_dimension() {
        let mut config = AppConfig::default();
        config.store.vector_dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [store]
            collection = "services"
            vector_dimension = 384
            write_mode = "incremental"
            "#,
        )
        .unwrap();

        assert_eq!(config.store.collection, "services");
        assert_eq!(config.store.vector_dimension, 384);
        assert_eq!(config.store.write_mode, WriteMode::Incremental);
        assert_eq!(config.store.qdrant_url, "http://localhost:6334");
        assert_eq!(config.retrieval.top_k, 5);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = AppConfig::from_file("/nonexistent/vecrag.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileReadError { .. }));
    }
}
