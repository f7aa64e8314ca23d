use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;

/// Number of retrieved URLs kept on each row for auditing
pub const TOP_URLS_KEPT: usize = 5;

/// All metrics at one cutoff
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CutoffMetrics {
    pub k: usize,
    pub precision: f64,
    pub recall: f64,
    pub hit_rate: f64,
    pub reciprocal_rank: f64,
    pub ndcg: f64,
}

impl CutoffMetrics {
    #[must_use]
    pub const fn zero(k: usize) -> Self {
        Self {
            k,
            precision: 0.0,
            recall: 0.0,
            hit_rate: 0.0,
            reciprocal_rank: 0.0,
            ndcg: 0.0,
        }
    }
}

/// Scores of one evaluation query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub id: String,
    pub query: String,
    pub cutoffs: Vec<CutoffMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_expected: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_pred: Option<String>,
    pub top_urls: Vec<String>,
}

impl MetricRow {
    #[must_use]
    pub fn at(&self, k: usize) -> Option<&CutoffMetrics> {
        self.cutoffs.iter().find(|m| m.k == k)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SectionAccuracy {
    pub correct: usize,
    pub total: usize,
    pub accuracy: f64,
}

/// Per-cutoff means over all scored queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    pub queries: usize,
    pub cutoffs: Vec<CutoffMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section_accuracy: Option<SectionAccuracy>,
}

impl EvalSummary {
    /// Average `rows` per cutoff; fails on an empty set
    pub fn from_rows(rows: &[MetricRow], ks: &[usize]) -> Result<Self> {
        if rows.is_empty() {
            return Err(EvalError::NoQueries);
        }
        let n = rows.len() as f64;
        let cutoffs = ks
            .iter()
            .map(|&k| {
                let mut sum = CutoffMetrics::zero(k);
                for row in rows {
                    if let Some(m) = row.at(k) {
                        sum.precision += m.precision;
                        sum.recall += m.recall;
                        sum.hit_rate += m.hit_rate;
                        sum.reciprocal_rank += m.reciprocal_rank;
                        sum.ndcg += m.ndcg;
                    }
                }
                CutoffMetrics {
                    k,
                    precision: sum.precision / n,
                    recall: sum.recall / n,
                    hit_rate: sum.hit_rate / n,
                    reciprocal_rank: sum.reciprocal_rank / n,
                    ndcg: sum.ndcg / n,
                }
            })
            .collect();

        let labeled: Vec<&MetricRow> = rows
            .iter()
            .filter(|row| row.section_expected.is_some())
            .collect();
        let section_accuracy = (!labeled.is_empty()).then(|| {
            let correct = labeled
                .iter()
                .filter(|row| row.section_expected == row.section_pred)
                .count();
            SectionAccuracy {
                correct,
                total: labeled.len(),
                accuracy: correct as f64 / labeled.len() as f64,
            }
        });

        Ok(Self {
            queries: rows.len(),
            cutoffs,
            section_accuracy,
        })
    }
}

/// Console summary, one block per cutoff
#[must_use]
pub fn render_summary(summary: &EvalSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Retrieval Evaluation Summary ===");
    let _ = writeln!(out, "Queries evaluated: {}", summary.queries);
    for m in &summary.cutoffs {
        let k = m.k;
        let _ = writeln!(out, "\n-- @ {k} --");
        let _ = writeln!(out, "Precision@{k}: {:.3}", m.precision);
        let _ = writeln!(out, "Recall@{k}:    {:.3}", m.recall);
        let _ = writeln!(out, "HitRate@{k}:   {:.3}", m.hit_rate);
        let _ = writeln!(out, "MRR@{k}:       {:.3}", m.reciprocal_rank);
        let _ = writeln!(out, "nDCG@{k}:      {:.3}", m.ndcg);
    }
    if let Some(sections) = &summary.section_accuracy {
        let _ = writeln!(
            out,
            "\nSection accuracy (majority of top-3): {:.3} ({}/{})",
            sections.accuracy, sections.correct, sections.total
        );
    }
    out
}

/// Markdown report: summary table plus the weakest queries at the largest cutoff
#[must_use]
pub fn render_markdown(summary: &EvalSummary, rows: &[MetricRow], dataset: &str) -> String {
    let mut md = String::new();
    md.push_str("# Retrieval eval report\n\n");
    md.push_str(&format!("- Dataset: `{dataset}`\n"));
    md.push_str(&format!("- Queries: `{}`\n", summary.queries));
    if let Some(sections) = &summary.section_accuracy {
        md.push_str(&format!(
            "- Section accuracy (top-3 majority): `{:.3}` ({}/{})\n",
            sections.accuracy, sections.correct, sections.total
        ));
    }
    md.push('\n');

    md.push_str("## Summary\n\n");
    md.push_str("| k | precision | recall | hit_rate | mrr | ndcg |\n");
    md.push_str("|---:|---:|---:|---:|---:|---:|\n");
    for m in &summary.cutoffs {
        md.push_str(&format!(
            "| `{}` | `{:.3}` | `{:.3}` | `{:.3}` | `{:.3}` | `{:.3}` |\n",
            m.k, m.precision, m.recall, m.hit_rate, m.reciprocal_rank, m.ndcg
        ));
    }
    md.push('\n');

    let Some(k) = summary.cutoffs.iter().map(|m| m.k).max() else {
        return md;
    };
    let mut worst: Vec<(&MetricRow, CutoffMetrics)> = rows
        .iter()
        .map(|row| (row, row.at(k).copied().unwrap_or(CutoffMetrics::zero(k))))
        .collect();
    worst.sort_by(|(a_row, a), (b_row, b)| {
        a.reciprocal_rank
            .total_cmp(&b.reciprocal_rank)
            .then_with(|| a.recall.total_cmp(&b.recall))
            .then_with(|| a_row.id.cmp(&b_row.id))
    });

    md.push_str(&format!("## Worst queries (@{k})\n\n"));
    md.push_str("| id | mrr | recall | ndcg | top_url | query |\n");
    md.push_str("|---|---:|---:|---:|---|---|\n");
    for (row, m) in worst.into_iter().take(10) {
        md.push_str(&format!(
            "| `{}` | `{:.3}` | `{:.3}` | `{:.3}` | `{}` | `{}` |\n",
            row.id,
            m.reciprocal_rank,
            m.recall,
            m.ndcg,
            row.top_urls.first().map_or("n/a", String::as_str),
            escape_cell(&truncate_one_line(&row.query, 120)),
        ));
    }
    md.push('\n');
    md
}

/// Write rows as a pretty JSON array
pub async fn write_rows_json(path: impl AsRef<Path>, rows: &[MetricRow]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(rows)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

fn truncate_one_line(text: &str, max_chars: usize) -> String {
    let s = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if s.chars().count() <= max_chars {
        return s;
    }
    let truncated: String = s.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{truncated}…")
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}
