use super::load_retriever;
use crate::config::Settings;
use anyhow::Result;
use clap::Args;
use docqa_search::{format_citations, Citation, RetrievalResult, DEFAULT_MAX_CITATIONS};
use serde::Serialize;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Question to retrieve passages for
    pub text: String,

    /// Number of passages to return
    #[arg(long)]
    pub top_k: Option<usize>,

    /// Print JSON instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    query: &'a str,
    results: &'a [RetrievalResult],
    citations: &'a [Citation],
}

pub async fn run_query(settings: Settings, args: QueryArgs) -> Result<()> {
    let top_k = args.top_k.unwrap_or(settings.top_k);
    let retriever = load_retriever(&settings).await?;
    let results = retriever.retrieve(&args.text, top_k).await?;
    let citations = format_citations(&results, DEFAULT_MAX_CITATIONS);

    if args.json {
        let output = QueryOutput {
            query: &args.text,
            results: &results,
            citations: &citations,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("No passages found.");
        return Ok(());
    }
    for (rank, result) in results.iter().enumerate() {
        println!(
            "{}. [{:.3}] {} ({}) <{}>",
            rank + 1,
            result.score,
            if result.title.is_empty() {
                "(untitled)"
            } else {
                result.title.as_str()
            },
            result.section,
            result.source_url
        );
        println!("   {}", snippet(&result.text, 240));
    }
    println!("\nCitations:");
    for citation in &citations {
        println!("- {}: {}", citation.title, citation.url);
    }
    Ok(())
}

fn snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}
