//! ONNX Runtime backed inference model

use std::path::Path;
use std::sync::{Arc, Mutex};

use ort::session::Session;
use ort::value::Tensor;
use vecrag_core::{RagError, Result};

use super::registry::{InferenceModel, ModelLoader};
use super::tokenizer::TokenizedInput;

/// Loads `.onnx` models expecting `input_ids` and `attention_mask` of shape `[1, n]`
#[derive(Debug, Clone)]
pub struct OnnxModelLoader {
    intra_threads: usize,
}

impl OnnxModelLoader {
    pub fn new(intra_threads: usize) -> Self {
        Self { intra_threads }
    }
}

impl Default for OnnxModelLoader {
    fn default() -> Self {
        Self::new(1)
    }
}

struct OnnxModel {
    session: Mutex<Session>,
}

fn backend(context: &str) -> impl Fn(ort::Error) -> RagError + '_ {
    move |e| RagError::EmbeddingBackend(format!("{context}: {e}"))
}

impl ModelLoader for OnnxModelLoader {
    fn load(&self, path: &Path) -> Result<Arc<dyn InferenceModel>> {
        let session = Session::builder()
            .and_then(|builder| builder.with_intra_threads(self.intra_threads))
            .and_then(|builder| builder.commit_from_file(path))
            .map_err(|e| {
                RagError::Configuration(format!("Failed to load model {}: {e}", path.display()))
            })?;

        Ok(Arc::new(OnnxModel {
            session: Mutex::new(session),
        }))
    }
}

impl InferenceModel for OnnxModel {
    fn run(&self, input: &TokenizedInput) -> Result<Vec<f32>> {
        let shape = [1usize, input.len()];
        let input_ids = Tensor::from_array((shape, input.input_ids.clone()))
            .map_err(backend("Invalid input_ids tensor"))?;
        let attention_mask = Tensor::from_array((shape, input.attention_mask.clone()))
            .map_err(backend("Invalid attention_mask tensor"))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| RagError::Other(anyhow::anyhow!("Inference session lock poisoned")))?;

        let outputs = session
            .run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
            ])
            .map_err(backend("Inference failed"))?;

        let (_shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(backend("Unexpected model output"))?;

        Ok(data.to_vec())
    }
}
