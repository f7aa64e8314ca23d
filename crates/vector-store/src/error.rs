use thiserror::Error;

pub type Result<T> = std::result::Result<T, VectorStoreError>;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing credential for {provider} embeddings: set {variable}")]
    Credential {
        provider: &'static str,
        variable: &'static str,
    },

    #[error("Embedding error: {0}")]
    EmbeddingError(String),

    #[error("Corrupt index: {0}")]
    CorruptIndex(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid vector dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },

    #[error("Index was built with embedder '{built}' but '{configured}' is configured")]
    EmbedderMismatch { built: String, configured: String },
}

impl VectorStoreError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn embedding(msg: impl Into<String>) -> Self {
        Self::EmbeddingError(msg.into())
    }
}
