//! Embedding providers for generating vector representations
//!
//! Three interchangeable backends implement [`EmbeddingProvider`]:
//! - [`LocalInferenceProvider`](crate::local::LocalInferenceProvider): in-process model
//! - [`LocalServerProvider`]: Ollama-style local HTTP server
//! - [`RemoteHostedProvider`]: hosted inference API with a bearer token
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use vecrag_core::{EmbeddingConfig, EmbeddingProviderKind, EndpointStyle, RagError, Result};

use crate::local::{LocalInferenceProvider, ModelLoader, ModelRegistry};

// ============================================================================
// Embedding Trait
// ============================================================================

/// Trait for embedding generation
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding for a single text
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for multiple texts, one request per text
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// Get provider name for logging
    fn name(&self) -> &str;
}

/// Reject empty vectors coming back from a backend
pub(crate) fn non_empty(vector: Vec<f32>, backend: &str) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(RagError::EmbeddingBackend(format!(
            "{backend} returned an empty embedding"
        )));
    }
    Ok(vector)
}

fn http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RagError::Configuration(format!("HTTP client setup failed: {e}")))
}

// ============================================================================
// Local Server Provider
// ============================================================================

/// Local HTTP embedding server client (Ollama and compatibles)
pub struct LocalServerProvider {
    client: Client,
    base_url: String,
    model: String,
    style: EndpointStyle,
}

#[derive(Debug, Serialize)]
struct PromptEmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Debug, Serialize)]
struct InputEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct ServerEmbeddingResponse {
    #[serde(default)]
    embedding: Option<Vec<f32>>,
    #[serde(default)]
    embeddings: Option<Vec<Vec<f32>>>,
    #[serde(default)]
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

impl LocalServerProvider {
    /// Create a new local server client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        style: EndpointStyle,
    ) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            style,
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let mut provider = Self::new(
            config.server_url.clone(),
            config.model.clone(),
            config.endpoint_style,
        );
        provider.client = http_client(config.timeout_secs)?;
        Ok(provider)
    }

    fn endpoint(&self) -> String {
        format!("{}{}", self.base_url, self.style.path())
    }

    fn request_body(&self, text: &str) -> Result<serde_json::Value> {
        let body = match self.style {
            EndpointStyle::Ollama => serde_json::to_value(PromptEmbeddingRequest {
                model: &self.model,
                prompt: text,
            }),
            EndpointStyle::OpenAi => serde_json::to_value(InputEmbeddingRequest {
                model: &self.model,
                input: text,
            }),
        };
        body.map_err(|e| RagError::EmbeddingBackend(format!("Failed to encode request: {e}")))
    }
}

/// Extract the vector from `embedding`, `embeddings[0]` or `data[0].embedding`
fn parse_server_response(body: &str) -> Result<Vec<f32>> {
    let response: ServerEmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        RagError::EmbeddingBackend(format!("Failed to parse embedding response: {e}"))
    })?;

    let vector = response
        .embedding
        .or_else(|| response.embeddings.and_then(|rows| rows.into_iter().next()))
        .or_else(|| response.data.into_iter().next().map(|d| d.embedding))
        .ok_or_else(|| {
            RagError::EmbeddingBackend("Embedding field missing from response".to_string())
        })?;

    non_empty(vector, "Embedding server")
}

#[async_trait]
impl EmbeddingProvider for LocalServerProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.endpoint())
            .json(&self.request_body(text)?)
            .send()
            .await
            .map_err(|e| {
                RagError::EmbeddingBackend(format!("Embedding server request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingBackend(format!(
                "Embedding server error ({status}): {error_text}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            RagError::EmbeddingBackend(format!("Failed to read embedding response: {e}"))
        })?;

        let vector = parse_server_response(&body)?;
        tracing::debug!(dimension = vector.len(), "Server embedding generated");
        Ok(vector)
    }

    fn name(&self) -> &str {
        "local-server"
    }
}

// ============================================================================
// Remote Hosted Provider
// ============================================================================

/// Hosted inference API client (feature-extraction endpoint)
pub struct RemoteHostedProvider {
    client: Client,
    endpoint: String,
    api_token: String,
}

#[derive(Debug, Serialize)]
struct HostedEmbeddingRequest<'a> {
    inputs: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostedEmbeddingResponse {
    Flat(Vec<f32>),
    Nested(Vec<Vec<f32>>),
}

impl RemoteHostedProvider {
    /// Create a new hosted API client
    pub fn new(endpoint: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_token: api_token.into(),
        }
    }

    /// Create from config
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let api_token = config
            .hosted_api_token
            .as_ref()
            .ok_or_else(|| RagError::Configuration("Hosted API token required".to_string()))?;

        let mut provider = Self::new(config.hosted_endpoint.clone(), api_token.clone());
        provider.client = http_client(config.timeout_secs)?;
        Ok(provider)
    }
}

/// Parse a flat float array; a single nested row is flattened
fn parse_hosted_response(body: &str) -> Result<Vec<f32>> {
    let response: HostedEmbeddingResponse = serde_json::from_str(body).map_err(|e| {
        RagError::EmbeddingBackend(format!("Failed to parse hosted embedding response: {e}"))
    })?;

    let vector = match response {
        HostedEmbeddingResponse::Flat(vector) => vector,
        HostedEmbeddingResponse::Nested(rows) => rows.into_iter().next().unwrap_or_default(),
    };

    non_empty(vector, "Hosted API")
}

#[async_trait]
impl EmbeddingProvider for RemoteHostedProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_token)
            .json(&HostedEmbeddingRequest { inputs: text })
            .send()
            .await
            .map_err(|e| RagError::EmbeddingBackend(format!("Hosted request failed: {e}")))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(RagError::EmbeddingBackend(format!(
                "Hosted API error ({status}): {error_text}"
            )));
        }

        let body = response.text().await.map_err(|e| {
            RagError::EmbeddingBackend(format!("Failed to read hosted response: {e}"))
        })?;

        let vector = parse_hosted_response(&body)?;
        tracing::debug!(dimension = vector.len(), "Hosted embedding generated");
        Ok(vector)
    }

    fn name(&self) -> &str {
        "remote-hosted"
    }
}

// ============================================================================
// Factory function
// ============================================================================

/// Create an embedding provider from config.
///
/// The local backend needs a model loader: the explicit `loader` if
/// given, otherwise the ONNX loader when built with the `onnx` feature.
pub fn create_embedding_provider(
    config: &EmbeddingConfig,
    registry: Arc<ModelRegistry>,
    loader: Option<Arc<dyn ModelLoader>>,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match config.provider {
        EmbeddingProviderKind::Server => Ok(Arc::new(LocalServerProvider::from_config(config)?)),
        EmbeddingProviderKind::Hosted => Ok(Arc::new(RemoteHostedProvider::from_config(config)?)),
        EmbeddingProviderKind::Local => {
            let loader = match loader {
                Some(loader) => loader,
                None => default_loader()?,
            };
            let provider = LocalInferenceProvider::from_config(config, registry, loader)?;
            Ok(Arc::new(provider))
        }
    }
}

#[cfg(feature = "onnx")]
fn default_loader() -> Result<Arc<dyn ModelLoader>> {
    Ok(Arc::new(crate::local::OnnxModelLoader::default()))
}

#[cfg(not(feature = "onnx"))]
fn default_loader() -> Result<Arc<dyn ModelLoader>> {
    Err(RagError::Configuration(
        "No model loader available; build with the `onnx` feature".to_string(),
    ))
}

// ============================================================================
// Tests
// ============================================================================
