//! # docqa Chunker
//!
//! Word-window chunking for passage retrieval.
//!
//! Each source document's plain text is split on whitespace into fixed-size windows that overlap
//! the previous window's tail, so a fact spanning a window boundary still lands whole in one
//! passage. Every window carries its provenance: the source URL, the document title and a coarse
//! [`Section`] inferred from the URL.
//!
//! ```text
//! plain text ──> words ──> [w0 .. w349] [w270 .. w619] [w540 .. ]
//!                              │
//!                              └─> DocumentChunk { source_url, title, section, text }
//! ```
//!
//! ## Example
//!
//! ```rust
//! use docqa_chunker::{Chunker, ChunkerConfig, Section};
//!
//! let chunker = Chunker::new(ChunkerConfig::new(4, 1)).unwrap();
//! let chunks = chunker.chunk_document(
//!     "https://example.com/pay-bill",
//!     "Pay your bill",
//!     "you can pay online by card or bank transfer",
//! );
//! assert_eq!(chunks[0].text, "you can pay online");
//! assert_eq!(chunks[0].section, Section::Billing);
//! ```

mod chunker;
mod config;
mod error;
mod types;

pub use chunker::Chunker;
pub use config::{ChunkerConfig, DEFAULT_CHUNK_WORDS, DEFAULT_OVERLAP_WORDS};
pub use error::{ChunkerError, Result};
pub use types::{Chunk, DocumentChunk, Section};
