use crate::dataset::EvalQuery;
use crate::error::{EvalError, Result};
use crate::metrics::{
    hit_rate_at_k, majority_section, ndcg_at_k, precision_at_k, recall_at_k,
    reciprocal_rank_at_k,
};
use crate::report::{CutoffMetrics, EvalSummary, MetricRow, TOP_URLS_KEPT};
use docqa_search::{RetrievalResult, Retriever};
use std::collections::HashSet;

pub const DEFAULT_CUTOFFS: &[usize] = &[1, 3, 5];

/// Per-query rows and their aggregate
#[derive(Debug, Clone, PartialEq)]
pub struct EvalOutcome {
    pub rows: Vec<MetricRow>,
    pub summary: EvalSummary,
}

/// Scores a retriever against labeled queries at a fixed set of cutoffs.
pub struct MetricsEngine<'a> {
    retriever: &'a Retriever,
    ks: Vec<usize>,
}

impl<'a> MetricsEngine<'a> {
    /// `ks` must be non-empty; repeated cutoffs are dropped, first occurrence kept
    pub fn new(retriever: &'a Retriever, ks: &[usize]) -> Result<Self> {
        if ks.is_empty() {
            return Err(EvalError::InvalidCutoffs(
                "at least one cutoff is required".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        let ks: Vec<usize> = ks.iter().copied().filter(|k| seen.insert(*k)).collect();
        Ok(Self { retriever, ks })
    }

    #[must_use]
    pub fn cutoffs(&self) -> &[usize] {
        &self.ks
    }

    /// Retrieve `max(ks)` passages per query, score each cutoff and average
    pub async fn evaluate(&self, queries: &[EvalQuery]) -> Result<EvalOutcome> {
        if queries.is_empty() {
            return Err(EvalError::NoQueries);
        }
        let depth = self.ks.iter().copied().max().unwrap_or(0);

        let mut rows = Vec::with_capacity(queries.len());
        for query in queries {
            let results = self.retriever.retrieve(&query.query, depth).await?;
            let row = score_query(query, &results, &self.ks);
            log::debug!(
                "Scored {} ({} results): rr@{depth}={:.3}",
                row.id,
                results.len(),
                row.at(depth).map_or(0.0, |m| m.reciprocal_rank)
            );
            rows.push(row);
        }

        let summary = EvalSummary::from_rows(&rows, &self.ks)?;
        log::info!("Evaluated {} queries at cutoffs {:?}", rows.len(), self.ks);
        Ok(EvalOutcome { rows, summary })
    }
}

/// Score one query's ranked results at every cutoff in `ks`
#[must_use]
pub fn score_query(query: &EvalQuery, results: &[RetrievalResult], ks: &[usize]) -> MetricRow {
    let retrieved: Vec<&str> = results.iter().map(|r| r.source_url.as_str()).collect();
    let relevant: HashSet<&str> = query.relevant_urls.iter().map(String::as_str).collect();

    let cutoffs = ks
        .iter()
        .map(|&k| CutoffMetrics {
            k,
            precision: precision_at_k(&retrieved, &relevant, k),
            recall: recall_at_k(&retrieved, &relevant, k),
            hit_rate: hit_rate_at_k(&retrieved, &relevant, k),
            reciprocal_rank: reciprocal_rank_at_k(&retrieved, &relevant, k),
            ndcg: ndcg_at_k(&retrieved, &relevant, k),
        })
        .collect();

    let (section_expected, section_pred) = match &query.section {
        Some(expected) => (Some(expected.clone()), Some(majority_section(results))),
        None => (None, None),
    };

    MetricRow {
        id: query.id.clone(),
        query: query.query.clone(),
        cutoffs,
        section_expected,
        section_pred,
        top_urls: retrieved
            .iter()
            .take(TOP_URLS_KEPT)
            .map(|url| (*url).to_string())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_chunker::Section;
    use docqa_vector_store::Embedder;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn result(url: &str, section: Section) -> RetrievalResult {
        RetrievalResult {
            chunk_id: 0,
            source_url: url.to_string(),
            title: String::new(),
            section,
            text: String::new(),
            score: 0.0,
        }
    }

    fn query(relevant: &[&str], section: Option<&str>) -> EvalQuery {
        EvalQuery {
            id: "q1".to_string(),
            query: "question".to_string(),
            relevant_urls: relevant.iter().map(|s| (*s).to_string()).collect(),
            section: section.map(str::to_string),
        }
    }

    #[test]
    fn score_query_fills_every_cutoff() {
        let results: Vec<RetrievalResult> = ["a", "b", "c", "d", "e", "f"]
            .iter()
            .map(|url| result(url, Section::Billing))
            .collect();
        let row = score_query(&query(&["b", "d"], Some("billing")), &results, &[1, 3, 5]);

        assert_eq!(row.cutoffs.iter().map(|m| m.k).collect::<Vec<_>>(), vec![1, 3, 5]);
        let at3 = row.at(3).unwrap();
        assert!((at3.precision - 1.0 / 3.0).abs() < 1e-12);
        assert!((at3.recall - 0.5).abs() < 1e-12);
        assert!((at3.reciprocal_rank - 0.5).abs() < 1e-12);
        assert_eq!(row.at(1).unwrap().hit_rate, 0.0);
        assert_eq!(row.section_expected.as_deref(), Some("billing"));
        assert_eq!(row.section_pred.as_deref(), Some("billing"));
        assert_eq!(row.top_urls, vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn unlabeled_section_is_not_predicted() {
        let row = score_query(&query(&[], None), &[], &[3]);
        assert_eq!(row.section_pred, None);
        assert_eq!(row.at(3), Some(&CutoffMetrics::zero(3)));
        assert!(row.top_urls.is_empty());
    }

    #[test]
    fn cutoffs_are_validated_and_deduplicated() {
        let retriever = Retriever::new(Arc::new(Embedder::hashing(8)));
        assert!(matches!(
            MetricsEngine::new(&retriever, &[]),
            Err(EvalError::InvalidCutoffs(_))
        ));
        let engine = MetricsEngine::new(&retriever, &[5, 1, 5, 3, 1]).unwrap();
        assert_eq!(engine.cutoffs(), &[5, 1, 3]);
    }

    #[tokio::test]
    async fn empty_query_set_is_rejected() {
        let retriever = Retriever::new(Arc::new(Embedder::hashing(8)));
        let engine = MetricsEngine::new(&retriever, DEFAULT_CUTOFFS).unwrap();
        assert!(matches!(
            engine.evaluate(&[]).await,
            Err(EvalError::NoQueries)
        ));
    }

    #[tokio::test]
    async fn unloaded_retriever_surfaces_error() {
        let retriever = Retriever::new(Arc::new(Embedder::hashing(8)));
        let engine = MetricsEngine::new(&retriever, DEFAULT_CUTOFFS).unwrap();
        let err = engine.evaluate(&[query(&["a"], None)]).await.unwrap_err();
        assert!(matches!(
            err,
            EvalError::Search(docqa_search::SearchError::IndexNotLoaded)
        ));
    }
}
