use crate::error::{Result, VectorStoreError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

pub const INDEX_MANIFEST_SCHEMA_VERSION: u32 = 1;

/// Build metadata written next to the vectors and chunks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub schema_version: u32,
    /// Id of the embedder that produced the vectors, e.g. `hash:384`
    pub embedder: String,
    pub dimension: usize,
    pub chunks: usize,
    pub chunk_words: usize,
    pub overlap_words: usize,
    pub built_at_unix: u64,
}

impl IndexManifest {
    #[must_use]
    pub fn new(
        embedder: impl Into<String>,
        dimension: usize,
        chunks: usize,
        chunk_words: usize,
        overlap_words: usize,
    ) -> Self {
        Self {
            schema_version: INDEX_MANIFEST_SCHEMA_VERSION,
            embedder: embedder.into(),
            dimension,
            chunks,
            chunk_words,
            overlap_words,
            built_at_unix: unix_now(),
        }
    }

    /// Refuse an index whose vectors came from a different embedder
    pub fn ensure_embedder(&self, configured: &str) -> Result<()> {
        if self.embedder == configured {
            return Ok(());
        }
        Err(VectorStoreError::EmbedderMismatch {
            built: self.embedder.clone(),
            configured: configured.to_string(),
        })
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = tokio::fs::read(path.as_ref()).await?;
        let manifest: Self = serde_json::from_slice(&bytes)?;
        if manifest.schema_version != INDEX_MANIFEST_SCHEMA_VERSION {
            return Err(VectorStoreError::CorruptIndex(format!(
                "Unsupported manifest schema_version {} (expected {INDEX_MANIFEST_SCHEMA_VERSION})",
                manifest.schema_version
            )));
        }
        Ok(manifest)
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
