use crate::error::{Result, SearchError};
use crate::snapshot::IndexSnapshot;
use crate::types::RetrievalResult;
use docqa_vector_store::Embedder;
use std::sync::{Arc, PoisonError, RwLock};

/// Embeds queries and answers them from the installed index snapshot.
///
/// The lock is only held to clone or swap the snapshot `Arc`; searches run on the clone.
pub struct Retriever {
    embedder: Arc<Embedder>,
    snapshot: RwLock<Option<Arc<IndexSnapshot>>>,
}

impl Retriever {
    /// Create a retriever with no index loaded
    #[must_use]
    pub fn new(embedder: Arc<Embedder>) -> Self {
        Self {
            embedder,
            snapshot: RwLock::new(None),
        }
    }

    /// Create a retriever serving `snapshot`
    #[must_use]
    pub fn with_snapshot(embedder: Arc<Embedder>, snapshot: IndexSnapshot) -> Self {
        let retriever = Self::new(embedder);
        retriever.install(snapshot);
        retriever
    }

    #[must_use]
    pub fn embedder(&self) -> &Embedder {
        &self.embedder
    }

    /// Replace the served snapshot; returns the previous one
    pub fn install(&self, snapshot: IndexSnapshot) -> Option<Arc<IndexSnapshot>> {
        let mut slot = self
            .snapshot
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        slot.replace(Arc::new(snapshot))
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current().is_some()
    }

    /// The snapshot queries currently run against
    #[must_use]
    pub fn current(&self) -> Option<Arc<IndexSnapshot>> {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Top `top_k` passages for `query`, best first.
    ///
    /// Index hits with no matching chunk are dropped with a warning.
    pub async fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<RetrievalResult>> {
        let snapshot = self.current().ok_or(SearchError::IndexNotLoaded)?;

        let vector = self.embedder.embed_one(query).await?;
        let hits = snapshot.index().search(&vector, top_k)?;
        log::debug!("Query '{query}': {} hits (top_k {top_k})", hits.len());

        let mut results = Vec::with_capacity(hits.len());
        for hit in hits {
            match snapshot.chunks().get(hit.id) {
                Some(chunk) => results.push(RetrievalResult::from_chunk(chunk, hit.score)),
                None => log::warn!(
                    "Index hit {} has no chunk (chunk set holds {}); skipping",
                    hit.id,
                    snapshot.chunks().len()
                ),
            }
        }
        Ok(results)
    }
}
