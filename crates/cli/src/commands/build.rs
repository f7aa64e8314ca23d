use super::embedder;
use crate::config::Settings;
use crate::progress::progress_bar;
use anyhow::{Context, Result};
use clap::Args;
use docqa_chunker::Chunker;
use docqa_indexer::{publish, read_url_list, IndexBuilder, JsonlDocumentSource};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct BuildArgs {
    /// JSON Lines file of extracted documents ({url, title?, text})
    #[arg(long)]
    pub documents: PathBuf,

    /// Only index the URLs listed in this file, in its order
    #[arg(long)]
    pub urls: Option<PathBuf>,

    /// Words per chunk
    #[arg(long)]
    pub chunk_words: Option<usize>,

    /// Words shared by consecutive chunks
    #[arg(long)]
    pub overlap_words: Option<usize>,
}

pub async fn run_build(mut settings: Settings, args: BuildArgs, quiet: bool) -> Result<()> {
    if let Some(words) = args.chunk_words {
        settings.chunking.chunk_words = words;
    }
    if let Some(words) = args.overlap_words {
        settings.chunking.overlap_words = words;
    }

    let chunker = Chunker::new(settings.chunking).context("Invalid chunking settings")?;
    let builder = IndexBuilder::new(chunker, embedder(&settings)?);

    let urls = match &args.urls {
        Some(path) => Some(read_url_list(path).await?),
        None => None,
    };
    let source = JsonlDocumentSource::new(&args.documents);

    let pb = progress_bar(0, "embedding chunks", quiet);
    let output = builder
        .build_from(&source, urls.as_deref(), |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        })
        .await;
    pb.finish_and_clear();
    let output = output.context("Index build failed")?;

    let layout = settings.layout();
    publish(&output, &layout)
        .await
        .with_context(|| format!("Failed to write index to {}", layout.dir().display()))?;

    println!("{}", output.stats);
    println!("Saved vectors:  {}", layout.vectors_path().display());
    println!("Saved chunks:   {}", layout.chunks_path().display());
    println!("Saved manifest: {}", layout.manifest_path().display());
    if !output.stats.errors.is_empty() {
        log::warn!(
            "{} input record(s) were skipped; rerun with --verbose for details",
            output.stats.errors.len()
        );
        for error in &output.stats.errors {
            log::debug!("skipped: {error}");
        }
    }
    Ok(())
}
