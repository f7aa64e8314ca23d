//! # docqa Search
//!
//! Query-time retrieval over a built index.
//!
//! A [`Retriever`] embeds the query with the same [`Embedder`](docqa_vector_store::Embedder) the
//! index was built with, runs an exact inner-product search and joins each hit back to its chunk
//! by position. [`format_citations`] and [`GenerationContext`] shape the results for the
//! answer-generation step.

mod citations;
mod error;
mod retriever;
mod snapshot;
mod types;

pub use citations::{format_citations, Citation, GenerationContext, Passage, DEFAULT_MAX_CITATIONS};
pub use error::{Result, SearchError};
pub use retriever::Retriever;
pub use snapshot::IndexSnapshot;
pub use types::RetrievalResult;
