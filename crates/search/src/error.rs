use thiserror::Error;

pub type Result<T> = std::result::Result<T, SearchError>;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Vector store error: {0}")]
    VectorStoreError(#[from] docqa_vector_store::VectorStoreError),

    #[error("No index loaded; build one and load it before querying")]
    IndexNotLoaded,

    #[error("Index has {vectors} vectors but {chunks} chunks")]
    InconsistentSnapshot { vectors: usize, chunks: usize },
}
