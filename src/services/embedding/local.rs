//! Sentence-embedding model run in-process with ONNX Runtime.

use async_trait::async_trait;
use std::path::Path;
use std::sync::{Arc, Mutex};

use ndarray::{Array1, ArrayView2, Axis, Ix2};
use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use tokenizers::{Tokenizer, TruncationParams, TruncationStrategy};

use super::Embedder;
use crate::error::EmbeddingError;
use crate::models::ModelSpec;

struct OnnxModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    takes_token_type_ids: bool,
    dimension: usize,
}

/// Embeds text with a locally loaded model directory containing
/// `model.onnx` and `tokenizer.json`.
pub struct LocalModelEmbedder {
    model: Arc<OnnxModel>,
    spec: ModelSpec,
}

impl LocalModelEmbedder {
    pub fn load(spec: ModelSpec, model_dir: &Path, max_tokens: usize) -> Result<Self, EmbeddingError> {
        let model_path = model_dir.join("model.onnx");
        let tokenizer_path = model_dir.join("tokenizer.json");

        if !model_path.exists() {
            return Err(EmbeddingError::ModelNotFound(format!(
                "model not found: {}",
                model_path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .with_intra_threads(num_cpus())
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?
            .commit_from_file(&model_path)
            .map_err(|e: ort::Error| EmbeddingError::ModelLoad(e.to_string()))?;

        let takes_token_type_ids = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: max_tokens,
                strategy: TruncationStrategy::LongestFirst,
                ..Default::default()
            }))
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;
        tokenizer.with_padding(None);

        tracing::info!(
            model = %spec.model,
            dimension = spec.dimension,
            path = %model_dir.display(),
            "loaded local embedding model"
        );

        Ok(Self {
            model: Arc::new(OnnxModel {
                session: Mutex::new(session),
                tokenizer,
                takes_token_type_ids,
                dimension: spec.dimension,
            }),
            spec,
        })
    }
}

#[async_trait]
impl Embedder for LocalModelEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let model = Arc::clone(&self.model);
        let text = text.to_string();

        tokio::task::spawn_blocking(move || model.embed(&text))
            .await
            .map_err(|e| EmbeddingError::Inference(format!("inference task failed: {e}")))?
    }

    fn dimension(&self) -> usize {
        self.spec.dimension
    }

    fn model_name(&self) -> &str {
        &self.spec.model
    }
}

impl OnnxModel {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| EmbeddingError::Tokenizer(e.to_string()))?;

        let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| i64::from(id)).collect();
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| i64::from(m))
            .collect();
        let type_ids: Vec<i64> = encoding
            .get_type_ids()
            .iter()
            .map(|&t| i64::from(t))
            .collect();
        let seq_len = ids.len();

        let input_ids = Tensor::from_array(([1, seq_len], ids))
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;
        let attention_mask = Tensor::from_array(([1, seq_len], mask.clone()))
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;
        let token_type_ids = Tensor::from_array(([1, seq_len], type_ids))
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| EmbeddingError::Inference("session lock poisoned".to_string()))?;

        let outputs = if self.takes_token_type_ids {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask,
                "token_type_ids" => token_type_ids
            ])
        } else {
            session.run(ort::inputs![
                "input_ids" => input_ids,
                "attention_mask" => attention_mask
            ])
        }
        .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e: ort::Error| EmbeddingError::Inference(e.to_string()))?;

        let hidden = output.shape().last().copied().unwrap_or(0);
        if hidden != self.dimension {
            return Err(EmbeddingError::Inference(format!(
                "model produced {hidden}-dimensional output, expected {}",
                self.dimension
            )));
        }

        let embedding = match output.ndim() {
            // token embeddings [1, seq, hidden]
            3 => {
                let tokens = output
                    .index_axis(Axis(0), 0)
                    .into_dimensionality::<Ix2>()
                    .map_err(|e| EmbeddingError::Inference(e.to_string()))?;
                mean_pool(tokens, &mask)?
            }
            2 => output.index_axis(Axis(0), 0).iter().copied().collect(),
            _ => {
                return Err(EmbeddingError::Inference(format!(
                    "unexpected output shape: {:?}",
                    output.shape()
                )));
            }
        };

        Ok(normalize(&embedding))
    }
}

/// Mean of the token rows whose attention mask is set.
fn mean_pool(tokens: ArrayView2<f32>, mask: &[i64]) -> Result<Vec<f32>, EmbeddingError> {
    if tokens.nrows() != mask.len() {
        return Err(EmbeddingError::Inference(format!(
            "model returned {} token rows for {} tokens",
            tokens.nrows(),
            mask.len()
        )));
    }

    let weights = Array1::from_iter(mask.iter().map(|&m| if m == 1 { 1.0f32 } else { 0.0 }));
    let attended = weights.sum().max(1.0);
    let summed = tokens.t().dot(&weights);
    Ok((summed / attended).to_vec())
}

fn normalize(v: &[f32]) -> Vec<f32> {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

fn num_cpus() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}
