use crate::error::{Result, SearchError};
use docqa_vector_store::{
    ChunkSet, Embedder, FlatIndex, IndexLayout, IndexManifest, VectorStoreError,
};

/// A vector index together with the chunk set it was built from.
///
/// Row `i` of the index and chunk `i` of the set describe the same passage; construction rejects
/// pairs whose lengths differ.
#[derive(Debug, Clone)]
pub struct IndexSnapshot {
    index: FlatIndex,
    chunks: ChunkSet,
    manifest: Option<IndexManifest>,
}

impl IndexSnapshot {
    pub fn new(index: FlatIndex, chunks: ChunkSet) -> Result<Self> {
        if index.len() != chunks.len() {
            return Err(SearchError::InconsistentSnapshot {
                vectors: index.len(),
                chunks: chunks.len(),
            });
        }
        Ok(Self {
            index,
            chunks,
            manifest: None,
        })
    }

    /// Load a published index, refusing one built by a different embedder
    pub async fn load(layout: &IndexLayout, embedder: &Embedder) -> Result<Self> {
        let manifest = IndexManifest::load(layout.manifest_path()).await?;
        manifest.ensure_embedder(embedder.id())?;

        let index = FlatIndex::load(layout.vectors_path()).await?;
        if !index.is_empty() && index.dimension() != manifest.dimension {
            return Err(VectorStoreError::CorruptIndex(format!(
                "manifest records dimension {} but vectors have {}",
                manifest.dimension,
                index.dimension()
            ))
            .into());
        }
        let chunks = ChunkSet::load(layout.chunks_path()).await?;

        let mut snapshot = Self::new(index, chunks)?;
        log::info!(
            "Loaded index from {} ({} chunks, dimension {}, embedder {})",
            layout.dir().display(),
            snapshot.len(),
            snapshot.index.dimension(),
            manifest.embedder
        );
        snapshot.manifest = Some(manifest);
        Ok(snapshot)
    }

    #[must_use]
    pub const fn index(&self) -> &FlatIndex {
        &self.index
    }

    #[must_use]
    pub const fn chunks(&self) -> &ChunkSet {
        &self.chunks
    }

    #[must_use]
    pub const fn manifest(&self) -> Option<&IndexManifest> {
        self.manifest.as_ref()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}
