mod build;
mod eval;
mod query;

pub use build::{run_build, BuildArgs};
pub use eval::{run_eval, EvalArgs};
pub use query::{run_query, QueryArgs};

use crate::config::Settings;
use anyhow::{Context, Result};
use docqa_search::{IndexSnapshot, Retriever};
use docqa_vector_store::Embedder;
use std::sync::Arc;

pub(crate) fn embedder(settings: &Settings) -> Result<Arc<Embedder>> {
    let embedder = Embedder::from_config(&settings.embeddings).with_context(|| {
        format!(
            "Failed to initialize '{}' embeddings",
            settings.embeddings.provider
        )
    })?;
    Ok(Arc::new(embedder))
}

/// Retriever serving the index under `settings.index_dir`
pub(crate) async fn load_retriever(settings: &Settings) -> Result<Retriever> {
    let embedder = embedder(settings)?;
    let layout = settings.layout();
    let snapshot = IndexSnapshot::load(&layout, &embedder).await.with_context(|| {
        format!(
            "Failed to load index from {} (run `docqa build` first)",
            layout.dir().display()
        )
    })?;
    Ok(Retriever::with_snapshot(embedder, snapshot))
}
