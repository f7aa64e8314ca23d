use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of one index build
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStats {
    /// Documents that contributed at least one chunk
    pub documents: usize,
    /// Documents with no text to chunk
    pub empty_documents: usize,
    pub chunks: usize,
    pub total_words: usize,
    pub dimension: usize,
    pub embedder: String,
    /// Skipped input records, one message each
    pub errors: Vec<String>,
    pub time_ms: u64,
}

impl fmt::Display for BuildStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Documents: {} | Chunks: {} | Words: {} | Dim: {} | Embedder: {} | Skipped: {} | {}ms",
            self.documents,
            self.chunks,
            self.total_words,
            self.dimension,
            self.embedder,
            self.errors.len() + self.empty_documents,
            self.time_ms
        )
    }
}
