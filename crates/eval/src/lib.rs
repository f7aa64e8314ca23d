//! # docqa Eval
//!
//! Offline retrieval quality measurement.
//!
//! Labeled queries (`{id?, query, relevant_urls?, section?}` per line) are run through a
//! [`Retriever`](docqa_search::Retriever) and the ranked source URLs scored against the relevant
//! set at each cutoff: precision, recall, hit rate, reciprocal rank and binary-gain nDCG. When a
//! query carries an expected section, the majority section of the top three results is recorded
//! as the prediction.
//!
//! ```text
//! eval.jsonl ──> EvalQuery[] ──> MetricsEngine::evaluate
//!                                   ├─> MetricRow per query ──> report JSON
//!                                   └─> EvalSummary ──────────> console / Markdown
//! ```

mod dataset;
mod engine;
mod error;
pub mod metrics;
mod report;

pub use dataset::{load_queries, parse_queries, EvalQuery};
pub use engine::{score_query, EvalOutcome, MetricsEngine, DEFAULT_CUTOFFS};
pub use error::{EvalError, Result};
pub use report::{
    render_markdown, render_summary, write_rows_json, CutoffMetrics, EvalSummary, MetricRow,
    SectionAccuracy, TOP_URLS_KEPT,
};
