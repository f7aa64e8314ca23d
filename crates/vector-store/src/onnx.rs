use crate::embeddings::LocalModelConfig;
use crate::error::{Result, VectorStoreError};
use ndarray::{Array1, Array2, ArrayD, ArrayView1, ArrayView2, Ix2, Ix3};
use ort::session::{builder::GraphOptimizationLevel, Session, SessionInputs};
use ort::value::{DynTensor, Tensor};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use tokenizers::{Encoding, PaddingParams, PaddingStrategy, Tokenizer, TruncationParams};

const MODEL_FILE: &str = "model.onnx";
const TOKENIZER_FILE: &str = "tokenizer.json";

/// Sentence-transformer model exported to ONNX, executed on the CPU.
///
/// Produces mean-pooled token embeddings (or the model's pooled output when it already emits
/// one row per input).
pub(crate) struct LocalModelEmbedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    model_name: String,
    max_length: usize,
    max_batch: usize,
}

impl LocalModelEmbedder {
    pub(crate) fn new(config: &LocalModelConfig) -> Result<Self> {
        let model_dir = config.model_dir.as_path();
        let model_path = model_dir.join(MODEL_FILE);
        let tokenizer_path = model_dir.join(TOKENIZER_FILE);
        for required in [&model_path, &tokenizer_path] {
            if !required.is_file() {
                return Err(VectorStoreError::configuration(format!(
                    "Local embedding model asset missing: {} (expected {MODEL_FILE} and {TOKENIZER_FILE} in {})",
                    required.display(),
                    model_dir.display()
                )));
            }
        }
        if config.max_length == 0 || config.batch_size == 0 {
            return Err(VectorStoreError::configuration(
                "local max_length and batch_size must be > 0",
            ));
        }

        let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| VectorStoreError::embedding(format!("Tokenizer load failed: {e}")))?;
        tokenizer.with_padding(Some(PaddingParams {
            strategy: PaddingStrategy::BatchLongest,
            ..PaddingParams::default()
        }));
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..TruncationParams::default()
            }))
            .map_err(|e| {
                VectorStoreError::embedding(format!("Tokenizer truncation failed: {e}"))
            })?;

        let threads = config.threads.unwrap_or_else(default_threads).max(1);
        let session = Session::builder()
            .map_err(|e| VectorStoreError::embedding(format!("{e}")))?
            .with_intra_threads(threads)
            .map_err(|e| {
                VectorStoreError::embedding(format!("Failed to set ORT intra threads: {e}"))
            })?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| {
                VectorStoreError::embedding(format!("Failed to set optimization level: {e}"))
            })?
            .commit_from_file(&model_path)
            .map_err(|e| VectorStoreError::embedding(format!("Failed to load ONNX model: {e}")))?;

        let model_name = model_name_from_dir(model_dir);
        log::info!(
            "Loaded ONNX model '{model_name}' (max_length {}, batch {}, threads {threads})",
            config.max_length,
            config.batch_size
        );

        Ok(Self {
            session: Mutex::new(session),
            tokenizer,
            model_name,
            max_length: config.max_length,
            max_batch: config.batch_size,
        })
    }

    pub(crate) fn model_name(&self) -> &str {
        &self.model_name
    }

    pub(crate) const fn batch_size(&self) -> usize {
        self.max_batch
    }

    pub(crate) fn embed_batch_blocking(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.max_batch) {
            let encodings = self
                .tokenizer
                .encode_batch(batch.to_vec(), true)
                .map_err(|e| VectorStoreError::embedding(format!("Tokenization failed: {e}")))?;

            if encodings.is_empty() {
                continue;
            }

            let seq_len = encodings[0].len();
            if seq_len > self.max_length {
                return Err(VectorStoreError::embedding(format!(
                    "Tokenized length {seq_len} exceeds max_length {}",
                    self.max_length
                )));
            }
            if encodings.iter().any(|e| e.len() != seq_len) {
                return Err(VectorStoreError::embedding(
                    "Inconsistent sequence lengths after padding",
                ));
            }
            let BatchTensors {
                input_ids,
                attention_mask,
                token_type_ids,
            } = BatchTensors::from_encodings(&encodings, seq_len);

            let mut available: HashMap<String, DynTensor> = HashMap::new();
            available.insert("input_ids".to_string(), to_tensor(input_ids)?);
            available.insert(
                "attention_mask".to_string(),
                to_tensor(attention_mask.clone())?,
            );
            available.insert("token_type_ids".to_string(), to_tensor(token_type_ids)?);

            let array = {
                let mut session = self
                    .session
                    .lock()
                    .map_err(|_| VectorStoreError::embedding("Failed to lock ONNX session"))?;

                let mut feed: HashMap<String, DynTensor> = HashMap::new();
                for input in &session.inputs {
                    let key = input.name.clone();
                    let Some(value) = available.remove(&key) else {
                        return Err(VectorStoreError::embedding(format!(
                            "Unsupported ONNX input '{key}'"
                        )));
                    };
                    feed.insert(key, value);
                }

                let outputs = session
                    .run(SessionInputs::from(feed))
                    .map_err(|e| VectorStoreError::embedding(format!("ONNX forward failed: {e}")))?;

                if outputs.len() == 0 {
                    return Err(VectorStoreError::embedding("ONNX returned no outputs"));
                }

                let array = outputs[0]
                    .try_extract_array::<f32>()
                    .map_err(|e| {
                        VectorStoreError::embedding(format!("Failed to decode ONNX output: {e}"))
                    })?
                    .to_owned();

                drop(outputs);
                drop(session);

                array
            };
            results.extend(pool_output(array, attention_mask.view())?);
        }

        Ok(results)
    }
}

fn to_tensor(array: Array2<i64>) -> Result<DynTensor> {
    Ok(Tensor::from_array(array.into_dyn())
        .map_err(|e| VectorStoreError::embedding(format!("{e}")))?
        .upcast())
}

fn model_name_from_dir(dir: &Path) -> String {
    dir.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("model")
        .to_string()
}

fn default_threads() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    if cpus <= 4 {
        1
    } else if cpus <= 12 {
        2
    } else {
        4
    }
}

/// Token ids, attention mask and segment ids of one padded batch, `[batch, seq_len]` each
struct BatchTensors {
    input_ids: Array2<i64>,
    attention_mask: Array2<i64>,
    token_type_ids: Array2<i64>,
}

impl BatchTensors {
    fn from_encodings(encodings: &[Encoding], seq_len: usize) -> Self {
        let matrix = |field: fn(&Encoding) -> &[u32]| {
            Array2::from_shape_fn((encodings.len(), seq_len), |(row, col)| {
                field(&encodings[row]).get(col).map_or(0, |&v| i64::from(v))
            })
        };
        Self {
            input_ids: matrix(Encoding::get_ids),
            attention_mask: matrix(Encoding::get_attention_mask),
            token_type_ids: matrix(Encoding::get_type_ids),
        }
    }
}

/// One vector per batch row from the model's first output.
///
/// Sentence-level `[batch, hidden]` outputs pass through; token-level `[batch, tokens, hidden]`
/// states are averaged over the tokens the attention mask keeps. Normalization is left to the
/// [`Embedder`](crate::Embedder) facade.
fn pool_output(output: ArrayD<f32>, attention_mask: ArrayView2<'_, i64>) -> Result<Vec<Vec<f32>>> {
    let bad_shape =
        |e: ndarray::ShapeError| VectorStoreError::embedding(format!("Bad output shape: {e}"));
    match output.ndim() {
        2 => {
            let sentences = output.into_dimensionality::<Ix2>().map_err(bad_shape)?;
            Ok(sentences.outer_iter().map(|row| row.to_vec()).collect())
        }
        3 => {
            let states = output.into_dimensionality::<Ix3>().map_err(bad_shape)?;
            let (batch, tokens, _) = states.dim();
            if attention_mask.dim() != (batch, tokens) {
                return Err(VectorStoreError::embedding(format!(
                    "Attention mask {:?} does not match token states {:?}",
                    attention_mask.shape(),
                    states.shape()
                )));
            }
            Ok(states
                .outer_iter()
                .zip(attention_mask.outer_iter())
                .map(|(sample, mask)| masked_mean(sample, mask))
                .collect())
        }
        _ => Err(VectorStoreError::embedding(format!(
            "Unexpected ONNX output dims: {:?}",
            output.shape()
        ))),
    }
}

fn masked_mean(tokens: ArrayView2<'_, f32>, mask: ArrayView1<'_, i64>) -> Vec<f32> {
    let weights: Array1<f32> = mask.mapv(|keep| if keep == 0 { 0.0 } else { 1.0 });
    let kept = weights.sum();
    let summed = weights.dot(&tokens);
    if kept == 0.0 {
        return summed.to_vec();
    }
    (summed / kept).to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn masked_mean_skips_padding_tokens() {
        let tokens = array![[1.0f32, 2.0], [3.0, 4.0], [100.0, 100.0]];
        let pooled = masked_mean(tokens.view(), array![1i64, 1, 0].view());
        assert_eq!(pooled, vec![2.0, 3.0]);
    }

    #[test]
    fn sentence_output_rows_pass_through() {
        let output = array![[1.0f32, 0.0], [0.0, 2.0]].into_dyn();
        let mask = Array2::<i64>::ones((2, 3));
        let out = pool_output(output, mask.view()).unwrap();
        assert_eq!(out, vec![vec![1.0, 0.0], vec![0.0, 2.0]]);
    }

    #[test]
    fn token_output_is_pooled_per_row() {
        let output = ndarray::Array3::from_shape_vec(
            (2, 2, 2),
            vec![1.0f32, 1.0, 3.0, 3.0, 5.0, 0.0, 9.0, 9.0],
        )
        .unwrap()
        .into_dyn();
        let mask = array![[1i64, 1], [1, 0]];
        let out = pool_output(output, mask.view()).unwrap();
        assert_eq!(out, vec![vec![2.0, 2.0], vec![5.0, 0.0]]);
    }

    #[test]
    fn mask_shape_must_match_token_states() {
        let output = ndarray::Array3::<f32>::zeros((2, 3, 4)).into_dyn();
        let mask = Array2::<i64>::ones((2, 2));
        assert!(pool_output(output, mask.view()).is_err());
    }

    #[test]
    fn batch_tensors_pad_short_encodings_with_zero() {
        let tensors = BatchTensors::from_encodings(&[Encoding::default()], 3);
        assert_eq!(tensors.input_ids, Array2::<i64>::zeros((1, 3)));
        assert_eq!(tensors.attention_mask, Array2::<i64>::zeros((1, 3)));
    }

    #[test]
    fn model_name_is_directory_name() {
        assert_eq!(
            model_name_from_dir(Path::new("models/all-MiniLM-L6-v2")),
            "all-MiniLM-L6-v2"
        );
    }

    #[tokio::test]
    #[ignore = "Requires an exported ONNX model under models/all-MiniLM-L6-v2"]
    async fn local_model_vectors_are_unit_length() {
        let embedder =
            crate::Embedder::from_config(&crate::EmbeddingConfig::default()).unwrap();
        let vectors = embedder
            .embed_batch(&["file a claim".to_string(), "pay my bill".to_string()])
            .await
            .unwrap();
        for vector in vectors {
            let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
            assert!((norm - 1.0).abs() < 1e-5);
        }
    }
}
