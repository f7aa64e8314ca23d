use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Chunker error: {0}")]
    ChunkerError(#[from] docqa_chunker::ChunkerError),

    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] docqa_vector_store::VectorStoreError),

    #[error("No chunks produced from {documents} document(s); nothing to index")]
    EmptyCorpus { documents: usize },

    #[error("Document source error: {0}")]
    Source(String),
}
