use crate::error::{IndexerError, Result};
use crate::source::{DocumentBatch, DocumentSource, SourceDocument};
use crate::stats::BuildStats;
use docqa_chunker::Chunker;
use docqa_vector_store::{ChunkSet, Embedder, FlatIndex, IndexManifest};
use std::sync::Arc;
use std::time::Instant;

/// Everything one build produces, ready to publish
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub index: FlatIndex,
    pub chunks: ChunkSet,
    pub manifest: IndexManifest,
    pub stats: BuildStats,
}

/// Chunks documents, embeds the chunks and assembles the flat index.
pub struct IndexBuilder {
    chunker: Chunker,
    embedder: Arc<Embedder>,
}

impl IndexBuilder {
    #[must_use]
    pub fn new(chunker: Chunker, embedder: Arc<Embedder>) -> Self {
        Self { chunker, embedder }
    }

    #[must_use]
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Load `source` (optionally restricted to `urls`) and build from it
    pub async fn build_from(
        &self,
        source: &dyn DocumentSource,
        urls: Option<&[String]>,
        on_progress: impl FnMut(usize, usize),
    ) -> Result<BuildOutput> {
        log::info!("Loading documents from {}", source.describe());
        let mut batch = source.load().await?;
        if let Some(urls) = urls {
            batch = batch.restrict_to(urls);
        }
        self.build(batch, on_progress).await
    }

    /// Build an index from already-loaded documents.
    ///
    /// `on_progress(embedded, total)` is called after every embedding batch.
    pub async fn build(
        &self,
        batch: DocumentBatch,
        mut on_progress: impl FnMut(usize, usize),
    ) -> Result<BuildOutput> {
        let start = Instant::now();
        let DocumentBatch { documents, errors } = batch;
        let document_count = documents.len();

        let mut stats = BuildStats {
            embedder: self.embedder.id().to_string(),
            errors,
            ..BuildStats::default()
        };
        let chunks = self.chunk_documents(&documents, &mut stats);
        if chunks.is_empty() {
            return Err(IndexerError::EmptyCorpus {
                documents: document_count,
            });
        }
        stats.chunks = chunks.len();
        stats.total_words = chunks.iter().map(docqa_chunker::Chunk::word_count).sum();

        let texts = chunks.texts();
        let total = texts.len();
        let batch_size = self.embedder.batch_size().max(1);
        let mut vectors = Vec::with_capacity(total);
        on_progress(0, total);
        for batch in texts.chunks(batch_size) {
            let embedded = self.embedder.embed_batch(batch).await?;
            vectors.extend(embedded);
            on_progress(vectors.len(), total);
        }

        let index = FlatIndex::from_vectors(&vectors)?;
        stats.dimension = index.dimension();

        let config = self.chunker.config();
        let manifest = IndexManifest::new(
            self.embedder.id(),
            index.dimension(),
            chunks.len(),
            config.chunk_words,
            config.overlap_words,
        );
        stats.time_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

        log::info!("Build complete: {stats}");
        Ok(BuildOutput {
            index,
            chunks,
            manifest,
            stats,
        })
    }

    fn chunk_documents(&self, documents: &[SourceDocument], stats: &mut BuildStats) -> ChunkSet {
        let mut chunks = ChunkSet::new();
        for doc in documents {
            let windows = self.chunker.chunk_document(&doc.url, &doc.title, &doc.text);
            if windows.is_empty() {
                log::warn!("Document {} has no text; skipping", doc.url);
                stats.empty_documents += 1;
                continue;
            }
            stats.documents += 1;
            for window in windows {
                chunks.push(window);
            }
        }
        chunks
    }
}
