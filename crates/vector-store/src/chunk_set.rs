use crate::error::{Result, VectorStoreError};
use docqa_chunker::{Chunk, DocumentChunk};
use std::path::Path;

/// Ordered chunks of one build, persisted as JSON Lines.
///
/// A chunk's position is its id: row `i` of the vector index belongs to `chunks[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChunkSet {
    chunks: Vec<Chunk>,
}

impl ChunkSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a document window, assigning it the next id
    pub fn push(&mut self, chunk: DocumentChunk) -> usize {
        let chunk_id = self.chunks.len();
        self.chunks.push(Chunk::from_document_chunk(chunk_id, chunk));
        chunk_id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: usize) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Chunk texts in id order, the embedding input of a build
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.chunks.iter().map(|chunk| chunk.text.clone()).collect()
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path).await?;
        let mut chunks = Vec::new();
        let mut mismatched = 0usize;
        for (line_no, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut chunk: Chunk = serde_json::from_str(line).map_err(|e| {
                VectorStoreError::CorruptIndex(format!(
                    "{}:{}: invalid chunk record: {e}",
                    path.display(),
                    line_no + 1
                ))
            })?;
            if chunk.chunk_id != chunks.len() {
                mismatched += 1;
                chunk.chunk_id = chunks.len();
            }
            chunks.push(chunk);
        }
        if mismatched > 0 {
            log::warn!(
                "{}: {mismatched} chunk(s) store an id that differs from their position; joining by position",
                path.display()
            );
        }
        log::debug!("Loaded {} chunks from {}", chunks.len(), path.display());
        Ok(Self { chunks })
    }

    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut out = Vec::new();
        for chunk in &self.chunks {
            serde_json::to_writer(&mut out, chunk)?;
            out.push(b'\n');
        }
        let tmp = path.with_extension("jsonl.tmp");
        tokio::fs::write(&tmp, out).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

impl<'a> IntoIterator for &'a ChunkSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl From<Vec<DocumentChunk>> for ChunkSet {
    fn from(chunks: Vec<DocumentChunk>) -> Self {
        let mut set = Self::new();
        for chunk in chunks {
            set.push(chunk);
        }
        set
    }
}
