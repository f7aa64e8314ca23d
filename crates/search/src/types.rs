use docqa_chunker::{Chunk, Section};
use serde::{Deserialize, Serialize};

/// A retrieved passage: the chunk record plus its similarity score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub chunk_id: usize,
    pub source_url: String,
    pub title: String,
    pub section: Section,
    pub text: String,
    /// Inner product of query and chunk vectors (cosine similarity for unit vectors)
    pub score: f32,
}

impl RetrievalResult {
    #[must_use]
    pub fn from_chunk(chunk: &Chunk, score: f32) -> Self {
        Self {
            chunk_id: chunk.chunk_id,
            source_url: chunk.source_url.clone(),
            title: chunk.title.clone(),
            section: chunk.section,
            text: chunk.text.clone(),
            score,
        }
    }
}
