//! # docqa Vector Store
//!
//! Embeddings and exact vector search for passage retrieval.
//!
//! ## Features
//!
//! - **Pluggable embedders**: local ONNX sentence-transformer, OpenAI-compatible hosted endpoint,
//!   or model-free feature hashing, chosen once at construction
//! - **Unit-length vectors** from every provider, so inner product equals cosine similarity
//! - **Exact flat index** with deterministic tie-breaking and a compact binary format
//! - **JSON Lines chunk sets** joined to index rows by position
//!
//! ## Architecture
//!
//! ```text
//! DocumentChunk[]
//!     │
//!     ├──> ChunkSet ─────────> chunks.jsonl
//!     │
//!     ├──> Embedder (local | hosted | hash)
//!     │      └─> unit vectors [d]
//!     │
//!     ├──> FlatIndex ────────> vectors.bin
//!     │
//!     └──> IndexManifest ────> manifest.json
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docqa_vector_store::{Embedder, FlatIndex};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let embedder = Embedder::hashing(256);
//! let passages = vec![
//!     "file a claim online".to_string(),
//!     "pay your bill by card".to_string(),
//! ];
//! let vectors = embedder.embed_batch(&passages).await?;
//! let index = FlatIndex::from_vectors(&vectors)?;
//!
//! let query = embedder.embed_one("how do I pay my bill").await?;
//! let hits = index.search(&query, 1)?;
//! assert_eq!(hits[0].id, 1);
//! # Ok::<(), docqa_vector_store::VectorStoreError>(())
//! # }).unwrap();
//! ```

mod chunk_set;
mod embeddings;
mod error;
mod flat_index;
mod hosted;
mod manifest;
mod onnx;
mod paths;

pub use chunk_set::ChunkSet;
pub use embeddings::{
    Embedder, EmbeddingConfig, EmbeddingProvider, HostedApiConfig, LocalModelConfig,
    DEFAULT_HASH_DIMENSION, DEFAULT_HOSTED_BASE_URL, DEFAULT_HOSTED_MODEL,
    DEFAULT_LOCAL_MODEL_DIR,
};
pub use error::{Result, VectorStoreError};
pub use flat_index::{FlatIndex, Neighbor, FLAT_INDEX_FORMAT_VERSION};
pub use manifest::{IndexManifest, INDEX_MANIFEST_SCHEMA_VERSION};
pub use paths::{
    IndexLayout, CHUNKS_FILE_NAME, DEFAULT_INDEX_DIR, EVAL_REPORT_FILE_NAME, MANIFEST_FILE_NAME,
    VECTORS_FILE_NAME,
};
