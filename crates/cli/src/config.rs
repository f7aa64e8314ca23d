use anyhow::{Context, Result};
use docqa_chunker::ChunkerConfig;
use docqa_vector_store::{EmbeddingConfig, EmbeddingProvider, IndexLayout, DEFAULT_INDEX_DIR};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const CONFIG_ENV: &str = "DOCQA_CONFIG";
pub const DEFAULT_TOP_K: usize = 5;

/// Effective settings: defaults, then the TOML file, then environment, then flags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub index_dir: PathBuf,
    pub top_k: usize,
    pub chunking: ChunkerConfig,
    pub embeddings: EmbeddingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            top_k: DEFAULT_TOP_K,
            chunking: ChunkerConfig::default(),
            embeddings: EmbeddingConfig::default(),
        }
    }
}

impl Settings {
    /// Load from the process environment and an optional config file
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        Self::resolve(config_path, |key| std::env::var(key).ok())
    }

    /// Layer the file (explicit path, else `DOCQA_CONFIG`) and `env` over the defaults
    pub fn resolve(
        config_path: Option<&Path>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let file = config_path
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_ENV).map(PathBuf::from));
        let mut settings = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_env(env)?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let settings: Self = toml::from_str(&raw)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        log::debug!("Loaded config from {}", path.display());
        Ok(settings)
    }

    fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) -> Result<()> {
        let var = |key: &str| env(key).filter(|value| !value.trim().is_empty());

        if let Some(raw) = var("DOCQA_EMBEDDINGS_PROVIDER") {
            self.embeddings.provider = EmbeddingProvider::from_str(&raw)
                .context("Invalid DOCQA_EMBEDDINGS_PROVIDER")?;
        }
        if let Some(raw) = var("DOCQA_LOCAL_MODEL_DIR") {
            self.embeddings.local.model_dir = PathBuf::from(raw);
        }
        if let Some(raw) = var("DOCQA_HOSTED_MODEL") {
            self.embeddings.hosted.model = raw;
        }
        if let Some(raw) = var("DOCQA_HOSTED_BASE_URL") {
            self.embeddings.hosted.base_url = raw;
        }
        if let Some(raw) = var("DOCQA_HOSTED_DIMENSIONS") {
            self.embeddings.hosted.dimensions = Some(parse_number("DOCQA_HOSTED_DIMENSIONS", &raw)?);
        }
        if let Some(raw) = var("OPENAI_API_KEY") {
            self.embeddings.hosted.api_key = Some(raw);
        }
        if let Some(raw) = var("DOCQA_HASH_DIMENSION") {
            self.embeddings.hash_dimension = parse_number("DOCQA_HASH_DIMENSION", &raw)?;
        }
        if let Some(raw) = var("DOCQA_CHUNK_WORDS") {
            self.chunking.chunk_words = parse_number("DOCQA_CHUNK_WORDS", &raw)?;
        }
        if let Some(raw) = var("DOCQA_CHUNK_OVERLAP_WORDS") {
            self.chunking.overlap_words = parse_number("DOCQA_CHUNK_OVERLAP_WORDS", &raw)?;
        }
        if let Some(raw) = var("DOCQA_TOP_K") {
            self.top_k = parse_number("DOCQA_TOP_K", &raw)?;
        }
        if let Some(raw) = var("DOCQA_INDEX_DIR") {
            self.index_dir = PathBuf::from(raw);
        }
        Ok(())
    }

    #[must_use]
    pub fn layout(&self) -> IndexLayout {
        IndexLayout::new(&self.index_dir)
    }
}

fn parse_number(key: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a non-negative integer, got '{raw}'"))
}
