//! In-process embedding: tokenizer plus a shared inference model
//!
//! The model is resolved through a [`ModelRegistry`] on the first
//! `embed` call and reused afterwards. Tokenization and inference run on
//! tokio's blocking pool.

mod registry;
mod tokenizer;

#[cfg(feature = "onnx")]
mod onnx;

pub use registry::{InferenceModel, ModelLoader, ModelRegistry};
pub use tokenizer::{
    TokenizedInput, Vocabulary, WordPieceTokenizer, CLS_TOKEN, SEP_TOKEN, UNK_TOKEN,
};

#[cfg(feature = "onnx")]
pub use onnx::OnnxModelLoader;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use vecrag_core::{EmbeddingConfig, RagError, Result};

use crate::embedding::{non_empty, EmbeddingProvider};

/// Local tokenizer + model embedding provider
pub struct LocalInferenceProvider {
    tokenizer: Arc<WordPieceTokenizer>,
    registry: Arc<ModelRegistry>,
    loader: Arc<dyn ModelLoader>,
    model_path: PathBuf,
}

impl LocalInferenceProvider {
    /// Create a provider; the model itself is loaded on first use
    pub fn new(
        tokenizer: WordPieceTokenizer,
        model_path: impl Into<PathBuf>,
        registry: Arc<ModelRegistry>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            tokenizer: Arc::new(tokenizer),
            registry,
            loader,
            model_path: model_path.into(),
        }
    }

    /// Create from config; the vocabulary is read immediately
    pub fn from_config(
        config: &EmbeddingConfig,
        registry: Arc<ModelRegistry>,
        loader: Arc<dyn ModelLoader>,
    ) -> Result<Self> {
        let vocab_path = config
            .vocab_path
            .as_ref()
            .ok_or_else(|| RagError::Configuration("Vocabulary path required".to_string()))?;
        let model_path = config
            .model_path
            .clone()
            .ok_or_else(|| RagError::Configuration("Model path required".to_string()))?;

        let tokenizer = WordPieceTokenizer::from_file(vocab_path)?;
        Ok(Self::new(tokenizer, model_path, registry, loader))
    }
}

#[async_trait]
impl EmbeddingProvider for LocalInferenceProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokenizer = Arc::clone(&self.tokenizer);
        let registry = Arc::clone(&self.registry);
        let loader = Arc::clone(&self.loader);
        let model_path = self.model_path.clone();
        let text = text.to_string();

        let vector = tokio::task::spawn_blocking(move || {
            let model = registry.get_or_load(&model_path, loader.as_ref())?;
            let input = tokenizer.tokenize(&text);
            model.run(&input)
        })
        .await
        .map_err(|e| RagError::EmbeddingBackend(format!("Inference task failed: {e}")))??;

        tracing::debug!(dimension = vector.len(), "Local embedding generated");
        non_empty(vector, "Local model")
    }

    fn name(&self) -> &str {
        "local-inference"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Emits the token ids as floats
    struct EchoModel;

    impl InferenceModel for EchoModel {
        fn run(&self, input: &TokenizedInput) -> Result<Vec<f32>> {
            Ok(input.input_ids.iter().map(|id| *id as f32).collect())
        }
    }

    #[derive(Default)]
    struct EchoLoader {
        loads: AtomicUsize,
    }

    impl ModelLoader for EchoLoader {
        fn load(&self, _path: &Path) -> Result<Arc<dyn InferenceModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(EchoModel))
        }
    }

    fn tokenizer() -> WordPieceTokenizer {
        WordPieceTokenizer::new(Vocabulary::from_lines(["[UNK]", "[CLS]", "[SEP]", "cloud"]))
            .unwrap()
    }

    #[tokio::test]
    async fn test_embed_runs_model_on_tokens() {
        let model_file = tempfile::NamedTempFile::new().unwrap();
        let loader = Arc::new(EchoLoader::default());
        let provider = LocalInferenceProvider::new(
            tokenizer(),
            model_file.path(),
            Arc::new(ModelRegistry::new()),
            loader.clone(),
        );

        let vector = provider.embed("cloud storage").await.unwrap();
        assert_eq!(vector, vec![1.0, 3.0, 0.0, 2.0]);
    }

    #[tokio::test]
    async fn test_providers_share_registry_model() {
        let model_file = tempfile::NamedTempFile::new().unwrap();
        let registry = Arc::new(ModelRegistry::new());
        let loader = Arc::new(EchoLoader::default());

        let a = LocalInferenceProvider::new(
            tokenizer(),
            model_file.path(),
            Arc::clone(&registry),
            loader.clone(),
        );
        let b = LocalInferenceProvider::new(
            tokenizer(),
            model_file.path(),
            Arc::clone(&registry),
            loader.clone(),
        );

        a.embed("cloud").await.unwrap();
        b.embed("cloud").await.unwrap();
        a.embed("cloud").await.unwrap();

        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_model_surfaces_configuration_error() {
        let provider = LocalInferenceProvider::new(
            tokenizer(),
            "/nonexistent/model.onnx",
            Arc::new(ModelRegistry::new()),
            Arc::new(EchoLoader::default()),
        );
        let err = provider.embed("cloud").await.unwrap_err();
        assert!(matches!(err, RagError::Configuration(_)));
    }

    #[test]
    fn test_from_config_requires_vocab() {
        let config = EmbeddingConfig {
            model_path: Some(PathBuf::from("model.onnx")),
            ..Default::default()
        };
        let result = LocalInferenceProvider::from_config(
            &config,
            Arc::new(ModelRegistry::new()),
            Arc::new(EchoLoader::default()),
        );
        assert!(matches!(result, Err(RagError::Configuration(_))));
    }
}
