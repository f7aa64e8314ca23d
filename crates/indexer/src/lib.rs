//! # docqa Indexer
//!
//! Batch index build for passage retrieval.
//!
//! ## Pipeline
//!
//! ```text
//! documents.jsonl ({url, title, text})
//!     │
//!     ├──> URL list filter (optional)
//!     │
//!     ├──> Chunker (overlapping word windows)
//!     │      └─> ChunkSet, ids = positions
//!     │
//!     ├──> Embedder (order-preserving batches)
//!     │      └─> FlatIndex
//!     │
//!     └──> publish: staging dir ──rename──> index dir
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use docqa_chunker::{Chunker, ChunkerConfig};
//! use docqa_indexer::{publish, IndexBuilder, JsonlDocumentSource};
//! use docqa_vector_store::{Embedder, IndexLayout};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let builder = IndexBuilder::new(
//!         Chunker::new(ChunkerConfig::default())?,
//!         Arc::new(Embedder::hashing(384)),
//!     );
//!     let source = JsonlDocumentSource::new("data/documents.jsonl");
//!     let output = builder.build_from(&source, None, |_, _| {}).await?;
//!     publish(&output, &IndexLayout::default()).await?;
//!
//!     println!("{}", output.stats);
//!     Ok(())
//! }
//! ```

mod builder;
mod error;
mod publish;
mod source;
mod stats;

pub use builder::{BuildOutput, IndexBuilder};
pub use error::{IndexerError, Result};
pub use publish::publish;
pub use source::{read_url_list, DocumentBatch, DocumentSource, JsonlDocumentSource, SourceDocument};
pub use stats::BuildStats;
