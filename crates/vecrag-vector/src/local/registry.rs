//! Shared inference models
//!
//! The registry is owned by the composition root and handed to every
//! local provider. Each model path is loaded at most once per registry;
//! concurrent first callers block on the same once-cell.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use once_cell::sync::OnceCell;
use vecrag_core::{RagError, Result};

use super::tokenizer::TokenizedInput;

/// A loaded embedding model
pub trait InferenceModel: Send + Sync {
    /// Run the model and return its flattened first output
    fn run(&self, input: &TokenizedInput) -> Result<Vec<f32>>;
}

/// Loads a model from disk
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<Arc<dyn InferenceModel>>;
}

type ModelCell = Arc<OnceCell<Arc<dyn InferenceModel>>>;

/// Lazily populated, process-shared model cache
#[derive(Default)]
pub struct ModelRegistry {
    models: Mutex<HashMap<PathBuf, ModelCell>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the model for `path`, loading it on first use.
    ///
    /// A failed load leaves the slot empty so a later call can retry.
    pub fn get_or_load(
        &self,
        path: &Path,
        loader: &dyn ModelLoader,
    ) -> Result<Arc<dyn InferenceModel>> {
        let cell = {
            let mut models = self
                .models
                .lock()
                .map_err(|_| RagError::Other(anyhow::anyhow!("Model registry lock poisoned")))?;
            Arc::clone(models.entry(path.to_path_buf()).or_default())
        };

        cell.get_or_try_init(|| {
            if !path.exists() {
                return Err(RagError::Configuration(format!(
                    "Model file not found: {}",
                    path.display()
                )));
            }
            tracing::info!(path = %path.display(), "Loading inference model");
            loader.load(path)
        })
        .map(Arc::clone)
    }

    /// Number of models currently loaded
    pub fn loaded(&self) -> usize {
        self.models
            .lock()
            .map(|models| models.values().filter(|cell| cell.get().is_some()).count())
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct ConstantModel;

    impl InferenceModel for ConstantModel {
        fn run(&self, input: &TokenizedInput) -> Result<Vec<f32>> {
            Ok(vec![input.len() as f32])
        }
    }

    #[derive(Default)]
    struct CountingLoader {
        loads: AtomicUsize,
    }

    impl ModelLoader for CountingLoader {
        fn load(&self, _path: &Path) -> Result<Arc<dyn InferenceModel>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(20));
            Ok(Arc::new(ConstantModel))
        }
    }

    #[test]
    fn test_missing_model_is_configuration_error() {
        let registry = ModelRegistry::new();
        let loader = CountingLoader::default();
        let result = registry.get_or_load(Path::new("/nonexistent/model.onnx"), &loader);

        assert!(matches!(result, Err(RagError::Configuration(_))));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 0);
        assert_eq!(registry.loaded(), 0);
    }

    #[test]
    fn test_model_loaded_once() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let registry = ModelRegistry::new();
        let loader = CountingLoader::default();

        let first = registry.get_or_load(file.path(), &loader).unwrap();
        let second = registry.get_or_load(file.path(), &loader).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
        assert_eq!(registry.loaded(), 1);
    }

    #[test]
    fn test_concurrent_first_use_loads_once() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();
        let registry = Arc::new(ModelRegistry::new());
        let loader = Arc::new(CountingLoader::default());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                let loader = Arc::clone(&loader);
                let path = path.clone();
                std::thread::spawn(move || {
                    registry.get_or_load(&path, loader.as_ref()).map(|_| ())
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap().unwrap();
        }
        assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    }
}
