use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    #[error("No evaluation queries to score")]
    NoQueries,

    #[error("Invalid cutoffs: {0}")]
    InvalidCutoffs(String),

    #[error("Invalid evaluation record at {location}: {message}")]
    Dataset { location: String, message: String },

    #[error("Search error: {0}")]
    Search(#[from] docqa_search::SearchError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
