use crate::builder::BuildOutput;
use crate::error::Result;
use docqa_vector_store::IndexLayout;
use std::path::Path;

/// Write a build to `layout`, replacing any previous index as a unit.
///
/// Files go to the sibling staging directory first. The live directory is then renamed aside and
/// staging renamed into its place, so a reader sees either the old triple or the new one.
pub async fn publish(output: &BuildOutput, layout: &IndexLayout) -> Result<()> {
    let staging = layout.staging();
    remove_dir_if_exists(staging.dir()).await?;
    tokio::fs::create_dir_all(staging.dir()).await?;

    output.index.save(staging.vectors_path()).await?;
    output.chunks.save(staging.chunks_path()).await?;
    output.manifest.save(staging.manifest_path()).await?;

    let retired = layout.retired_dir();
    remove_dir_if_exists(&retired).await?;
    let had_live = tokio::fs::try_exists(layout.dir()).await?;
    if had_live {
        tokio::fs::rename(layout.dir(), &retired).await?;
    }
    if let Err(err) = tokio::fs::rename(staging.dir(), layout.dir()).await {
        if had_live {
            // Put the previous index back before reporting the failure.
            if let Err(restore) = tokio::fs::rename(&retired, layout.dir()).await {
                log::error!(
                    "Failed to restore previous index from {}: {restore}",
                    retired.display()
                );
            }
        }
        return Err(err.into());
    }
    if had_live {
        if let Err(err) = tokio::fs::remove_dir_all(&retired).await {
            log::warn!("Failed to remove retired index {}: {err}", retired.display());
        }
    }

    log::info!(
        "Published index to {} ({} chunks)",
        layout.dir().display(),
        output.chunks.len()
    );
    Ok(())
}

async fn remove_dir_if_exists(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::IndexBuilder;
    use crate::source::{DocumentBatch, SourceDocument};
    use docqa_chunker::{Chunker, ChunkerConfig};
    use docqa_vector_store::{ChunkSet, Embedder, IndexManifest};
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn output(texts: &[&str]) -> BuildOutput {
        let builder = IndexBuilder::new(
            Chunker::new(ChunkerConfig::new(10, 0)).unwrap(),
            Arc::new(Embedder::hashing(32)),
        );
        let documents = texts
            .iter()
            .enumerate()
            .map(|(i, text)| SourceDocument {
                url: format!("https://example.com/{i}"),
                title: String::new(),
                text: (*text).to_string(),
            })
            .collect();
        builder
            .build(DocumentBatch::new(documents), |_, _| {})
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn publish_creates_then_replaces_index() {
        let tmp = TempDir::new().unwrap();
        let layout = IndexLayout::new(tmp.path().join("index"));

        publish(&output(&["first build"]).await, &layout).await.unwrap();
        assert!(layout.is_complete());
        assert_eq!(ChunkSet::load(layout.chunks_path()).await.unwrap().len(), 1);

        std::fs::write(layout.dir().join("stale.txt"), "old").unwrap();
        publish(&output(&["second", "build"]).await, &layout)
            .await
            .unwrap();

        assert_eq!(ChunkSet::load(layout.chunks_path()).await.unwrap().len(), 2);
        let manifest = IndexManifest::load(layout.manifest_path()).await.unwrap();
        assert_eq!(manifest.chunks, 2);
        assert!(!layout.dir().join("stale.txt").exists());
        assert!(!layout.staging().dir().exists());
        assert!(!layout.retired_dir().exists());
    }

    #[tokio::test]
    async fn leftover_staging_is_cleared() {
        let tmp = TempDir::new().unwrap();
        let layout = IndexLayout::new(tmp.path().join("index"));
        std::fs::create_dir_all(layout.staging().dir()).unwrap();
        std::fs::write(layout.staging().dir().join("junk"), "x").unwrap();

        publish(&output(&["fresh"]).await, &layout).await.unwrap();
        assert!(layout.is_complete());
        assert!(!layout.dir().join("junk").exists());
    }
}
