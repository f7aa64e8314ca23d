use super::load_retriever;
use crate::config::Settings;
use anyhow::{Context, Result};
use clap::Args;
use docqa_eval::{
    load_queries, render_markdown, render_summary, write_rows_json, EvalSummary, MetricsEngine,
    DEFAULT_CUTOFFS,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct EvalArgs {
    /// JSON Lines evaluation set ({id?, query, relevant_urls?, section?})
    #[arg(long)]
    pub dataset: PathBuf,

    /// Cutoffs to score, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub ks: Vec<usize>,

    /// Per-query JSON report (default: <index-dir>/retrieval_eval_report.json)
    #[arg(long)]
    pub out_json: Option<PathBuf>,

    /// Also write a Markdown report
    #[arg(long)]
    pub out_md: Option<PathBuf>,

    /// Print the summary as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct EvalOutput<'a> {
    summary: &'a EvalSummary,
    report: String,
}

pub async fn run_eval(settings: Settings, args: EvalArgs) -> Result<()> {
    let ks = if args.ks.is_empty() {
        DEFAULT_CUTOFFS.to_vec()
    } else {
        args.ks.clone()
    };
    let queries = load_queries(&args.dataset)
        .await
        .with_context(|| format!("Failed to read {}", args.dataset.display()))?;

    let retriever = load_retriever(&settings).await?;
    let engine = MetricsEngine::new(&retriever, &ks)?;
    let outcome = engine.evaluate(&queries).await?;

    let report_path = args
        .out_json
        .clone()
        .unwrap_or_else(|| settings.layout().eval_report_path());
    write_rows_json(&report_path, &outcome.rows)
        .await
        .with_context(|| format!("Failed to write {}", report_path.display()))?;

    if let Some(md_path) = &args.out_md {
        let md = render_markdown(
            &outcome.summary,
            &outcome.rows,
            &args.dataset.display().to_string(),
        );
        tokio::fs::write(md_path, md)
            .await
            .with_context(|| format!("Failed to write {}", md_path.display()))?;
    }

    if args.json {
        let output = EvalOutput {
            summary: &outcome.summary,
            report: report_path.display().to_string(),
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print!("{}", render_summary(&outcome.summary));
        println!("\nSaved per-query report: {}", report_path.display());
    }
    Ok(())
}
