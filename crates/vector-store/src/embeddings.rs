use crate::error::{Result, VectorStoreError};
use crate::hosted::HostedApiEmbedder;
use crate::onnx::LocalModelEmbedder;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

pub const DEFAULT_HASH_DIMENSION: usize = 384;
pub const DEFAULT_HOSTED_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_HOSTED_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_LOCAL_MODEL_DIR: &str = "models/all-MiniLM-L6-v2";

/// Which embedding backend serves a process
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// Sentence-transformer model exported to ONNX, run in-process
    #[default]
    #[serde(alias = "sbert", alias = "onnx")]
    Local,
    /// OpenAI-compatible embeddings endpoint
    #[serde(alias = "openai")]
    Hosted,
    /// Model-free feature hashing (offline builds and tests)
    #[serde(alias = "stub")]
    Hash,
}

impl EmbeddingProvider {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Local => "local",
            Self::Hosted => "hosted",
            Self::Hash => "hash",
        }
    }
}

impl FromStr for EmbeddingProvider {
    type Err = VectorStoreError;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "local" | "sbert" | "onnx" => Ok(Self::Local),
            "hosted" | "openai" => Ok(Self::Hosted),
            "hash" | "stub" => Ok(Self::Hash),
            other => Err(VectorStoreError::configuration(format!(
                "Unknown embeddings provider '{other}' (expected 'local', 'hosted' or 'hash')"
            ))),
        }
    }
}

impl fmt::Display for EmbeddingProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ONNX model settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalModelConfig {
    /// Directory holding `model.onnx` and `tokenizer.json`
    pub model_dir: PathBuf,
    pub max_length: usize,
    pub batch_size: usize,
    /// Intra-op threads; defaults to a small share of the available cores
    pub threads: Option<usize>,
}

impl Default for LocalModelConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from(DEFAULT_LOCAL_MODEL_DIR),
            max_length: 256,
            batch_size: 32,
            threads: None,
        }
    }
}

/// OpenAI-compatible endpoint settings
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostedApiConfig {
    pub base_url: String,
    pub model: String,
    pub dimensions: Option<usize>,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: usize,
    pub batch_size: usize,
}

impl Default for HostedApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_HOSTED_BASE_URL.to_string(),
            model: DEFAULT_HOSTED_MODEL.to_string(),
            dimensions: None,
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            batch_size: 64,
        }
    }
}

impl fmt::Debug for HostedApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostedApiConfig")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

/// Full embedding configuration; only the section of the selected provider is used
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub local: LocalModelConfig,
    pub hosted: HostedApiConfig,
    pub hash_dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::default(),
            local: LocalModelConfig::default(),
            hosted: HostedApiConfig::default(),
            hash_dimension: DEFAULT_HASH_DIMENSION,
        }
    }
}

impl EmbeddingConfig {
    /// Config for the model-free hashing provider
    #[must_use]
    pub fn hashing(dimension: usize) -> Self {
        Self {
            provider: EmbeddingProvider::Hash,
            hash_dimension: dimension,
            ..Self::default()
        }
    }
}

/// Maps text to unit-length vectors.
///
/// The provider is resolved once in [`Embedder::from_config`]; every vector leaving this type is
/// L2-normalized regardless of what the backend returned, so index and query vectors always
/// share the same normalization.
pub struct Embedder {
    backend: EmbeddingBackend,
    id: String,
}

enum EmbeddingBackend {
    Local(Arc<LocalModelEmbedder>),
    Hosted(HostedApiEmbedder),
    Hash(HashingEmbedder),
}

impl Embedder {
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let (backend, id) = match config.provider {
            EmbeddingProvider::Local => {
                let local = LocalModelEmbedder::new(&config.local)?;
                let id = format!("local:{}", local.model_name());
                (EmbeddingBackend::Local(Arc::new(local)), id)
            }
            EmbeddingProvider::Hosted => {
                let hosted = HostedApiEmbedder::new(&config.hosted)?;
                let id = format!("hosted:{}", hosted.model());
                (EmbeddingBackend::Hosted(hosted), id)
            }
            EmbeddingProvider::Hash => {
                if config.hash_dimension == 0 {
                    return Err(VectorStoreError::configuration(
                        "hash_dimension must be > 0",
                    ));
                }
                let hash = HashingEmbedder::new(config.hash_dimension);
                let id = format!("hash:{}", config.hash_dimension);
                (EmbeddingBackend::Hash(hash), id)
            }
        };
        log::info!("Using embedder {id}");
        Ok(Self { backend, id })
    }

    /// Model-free embedder, handy for tests and offline builds
    #[must_use]
    pub fn hashing(dimension: usize) -> Self {
        let dimension = dimension.max(1);
        Self {
            backend: EmbeddingBackend::Hash(HashingEmbedder::new(dimension)),
            id: format!("hash:{dimension}"),
        }
    }

    /// Stable identifier of provider and model, recorded in index manifests
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Preferred number of texts per `embed_batch` call
    #[must_use]
    pub fn batch_size(&self) -> usize {
        match &self.backend {
            EmbeddingBackend::Local(local) => local.batch_size(),
            EmbeddingBackend::Hosted(hosted) => hosted.batch_size(),
            EmbeddingBackend::Hash(_) => 256,
        }
    }

    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.embed_batch(&[text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| VectorStoreError::embedding("Empty embedding result"))
    }

    /// Embed texts, preserving input order
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let raw = match &self.backend {
            EmbeddingBackend::Hash(hash) => hash.embed_batch(texts),
            EmbeddingBackend::Hosted(hosted) => hosted.embed_batch(texts).await?,
            EmbeddingBackend::Local(local) => {
                let local = local.clone();
                let owned = texts.to_vec();
                tokio::task::spawn_blocking(move || local.embed_batch_blocking(&owned))
                    .await
                    .map_err(|e| VectorStoreError::embedding(format!("Join error: {e}")))??
            }
        };

        finalize_batch(raw, texts.len())
    }

    #[must_use]
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot_product / (norm_a * norm_b)
    }
}

fn finalize_batch(mut vectors: Vec<Vec<f32>>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if vectors.len() != expected {
        return Err(VectorStoreError::embedding(format!(
            "Embedder returned {} vectors for {expected} inputs",
            vectors.len()
        )));
    }
    let dimension = vectors.first().map_or(0, Vec::len);
    if dimension == 0 {
        return Err(VectorStoreError::embedding("Embedder returned empty vectors"));
    }
    for vector in &mut vectors {
        if vector.len() != dimension {
            return Err(VectorStoreError::InvalidDimension {
                expected: dimension,
                actual: vector.len(),
            });
        }
        if normalize(vector) == 0.0 {
            return Err(VectorStoreError::embedding(
                "Embedder returned a zero vector",
            ));
        }
    }
    Ok(vectors)
}

/// Scale `vec` to unit length in place and return its original norm
pub(crate) fn normalize(vec: &mut [f32]) -> f32 {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return 0.0;
    }
    for value in vec {
        *value /= norm;
    }
    norm
}

/// Signed feature hashing over lowercase alphanumeric tokens.
///
/// Texts sharing vocabulary get high inner products; the mapping is fixed by `dimension` alone.
#[derive(Debug, Clone)]
struct HashingEmbedder {
    dimension: usize,
}

impl HashingEmbedder {
    const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_batch(&self, texts: &[String]) -> Vec<Vec<f32>> {
        texts.iter().map(|text| self.embed(text)).collect()
    }

    fn embed(&self, text: &str) -> Vec<f32> {
        let mut features = vec![0.0f32; self.dimension];
        let buckets = self.dimension as u64;
        let mut tokens = 0usize;
        for token in text
            .split(|ch: char| !ch.is_alphanumeric())
            .filter(|tok| !tok.is_empty())
        {
            let mut rng = BucketRng::seeded(&token.to_lowercase());
            let bucket = (rng.state % buckets) as usize;
            features[bucket] += if rng.next_u64() & 1 == 0 { 1.0 } else { -1.0 };
            tokens += 1;
        }
        // Tokens whose signs cancel out fall back too.
        if tokens == 0 || normalize(&mut features) == 0.0 {
            return self.fallback(text);
        }
        features
    }

    /// Unit vector drawn uniformly from `[-1, 1)^dimension`, seeded by the text and the dimension
    fn fallback(&self, text: &str) -> Vec<f32> {
        let mut rng = BucketRng::seeded(text);
        rng.state ^= (self.dimension as u64).wrapping_mul(BucketRng::GAMMA);
        let mut features: Vec<f32> = (0..self.dimension)
            .map(|_| {
                let unit = (rng.next_u64() >> 40) as f32 / (1u64 << 24) as f32;
                unit.mul_add(2.0, -1.0)
            })
            .collect();
        normalize(&mut features);
        features
    }
}

/// SplitMix64 stream whose seed is the FNV-1a hash of a string
struct BucketRng {
    state: u64,
}

impl BucketRng {
    const GAMMA: u64 = 0x9E37_79B9_7F4A_7C15;
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    fn seeded(text: &str) -> Self {
        let state = text.bytes().fold(Self::FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(Self::FNV_PRIME)
        });
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(Self::GAMMA);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn provider_parsing_accepts_aliases() {
        assert_eq!(
            "SBERT".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Local
        );
        assert_eq!(
            "openai".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Hosted
        );
        assert_eq!(
            "stub".parse::<EmbeddingProvider>().unwrap(),
            EmbeddingProvider::Hash
        );
    }

    #[test]
    fn unknown_provider_is_configuration_error() {
        let err = "word2vec".parse::<EmbeddingProvider>().unwrap_err();
        assert!(matches!(err, VectorStoreError::Configuration(_)), "{err}");
    }

    #[test]
    fn hosted_without_key_is_credential_error() {
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Hosted,
            ..EmbeddingConfig::default()
        };
        let Err(err) = Embedder::from_config(&config) else {
            panic!("expected missing key to fail");
        };
        assert!(matches!(err, VectorStoreError::Credential { .. }), "{err}");
    }

    #[test]
    fn local_without_model_files_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let config = EmbeddingConfig {
            provider: EmbeddingProvider::Local,
            local: LocalModelConfig {
                model_dir: dir.path().join("missing-model"),
                ..LocalModelConfig::default()
            },
            ..EmbeddingConfig::default()
        };
        let Err(err) = Embedder::from_config(&config) else {
            panic!("expected missing model to fail");
        };
        assert!(matches!(err, VectorStoreError::Configuration(_)), "{err}");
    }

    #[test]
    fn hosted_config_debug_redacts_key() {
        let config = HostedApiConfig {
            api_key: Some("sk-secret".to_string()),
            ..HostedApiConfig::default()
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn hashing_vectors_are_unit_length() {
        let embedder = Embedder::hashing(64);
        let texts = vec![
            "file a claim online".to_string(),
            "".to_string(),
            "!!! ???".to_string(),
            "pay pay pay pay".to_string(),
        ];
        let vectors = embedder.embed_batch(&texts).await.unwrap();
        assert_eq!(vectors.len(), texts.len());
        for vector in vectors {
            assert_eq!(vector.len(), 64);
            assert!((norm(&vector) - 1.0).abs() < 1e-5);
        }
    }

    #[tokio::test]
    async fn hashing_is_deterministic() {
        let embedder = Embedder::hashing(128);
        let a = embedder.embed_one("roadside assistance").await.unwrap();
        let b = embedder.embed_one("roadside assistance").await.unwrap();
        assert!((Embedder::cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn shared_vocabulary_scores_higher() {
        let embedder = Embedder::hashing(256);
        let query = embedder.embed_one("how do I pay my bill").await.unwrap();
        let billing = embedder
            .embed_one("pay your bill online with autopay")
            .await
            .unwrap();
        let claims = embedder
            .embed_one("report storm damage to start a claim")
            .await
            .unwrap();
        assert!(
            Embedder::cosine_similarity(&query, &billing)
                > Embedder::cosine_similarity(&query, &claims)
        );
    }

    #[test]
    fn tokenless_text_falls_back_to_seeded_unit_vector() {
        let hasher = HashingEmbedder::new(32);
        let dashes = hasher.embed("---");
        assert_eq!(dashes.len(), 32);
        assert!((norm(&dashes) - 1.0).abs() < 1e-5);
        assert_eq!(dashes, hasher.embed("---"));
        assert_ne!(dashes, hasher.embed("!!!"));
        assert_ne!(dashes, HashingEmbedder::new(33).embed("---")[..32].to_vec());
    }

    #[tokio::test]
    async fn embed_batch_of_nothing_is_empty() {
        let embedder = Embedder::hashing(8);
        assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
    }

    #[test]
    fn finalize_normalizes_and_rejects_bad_batches() {
        let out = finalize_batch(vec![vec![3.0, 4.0]], 1).unwrap();
        assert!((out[0][0] - 0.6).abs() < 1e-6);
        assert!((out[0][1] - 0.8).abs() < 1e-6);

        assert!(finalize_batch(vec![vec![0.0, 0.0]], 1).is_err());
        assert!(finalize_batch(vec![vec![1.0]], 2).is_err());
        assert!(matches!(
            finalize_batch(vec![vec![1.0, 0.0], vec![1.0]], 2),
            Err(VectorStoreError::InvalidDimension { .. })
        ));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        let sim = Embedder::cosine_similarity(&a, &b);
        assert!((sim - 1.0).abs() < 1e-6);

        let c = vec![1.0, 0.0];
        let d = vec![0.0, 1.0];
        let sim2 = Embedder::cosine_similarity(&c, &d);
        assert!((sim2 - 0.0).abs() < 1e-6);
    }

    #[test]
    fn config_fills_missing_fields_with_defaults() {
        let config: EmbeddingConfig = serde_json::from_value(serde_json::json!({
            "provider": "hosted",
            "hosted": { "model": "text-embedding-3-large", "dimensions": 256 }
        }))
        .unwrap();
        assert_eq!(config.provider, EmbeddingProvider::Hosted);
        assert_eq!(config.hosted.model, "text-embedding-3-large");
        assert_eq!(config.hosted.dimensions, Some(256));
        assert_eq!(config.hosted.base_url, DEFAULT_HOSTED_BASE_URL);
        assert_eq!(config.hash_dimension, DEFAULT_HASH_DIMENSION);
    }
}
