//! Rank metrics over document identifiers with binary relevance.
//!
//! Each function looks at the first `k` entries of `retrieved`. Entries are not deduplicated: a
//! document retrieved through several chunks counts once per occurrence, so precision and recall
//! can exceed what distinct documents would give (recall may even pass 1.0).

use docqa_search::RetrievalResult;
use std::collections::HashSet;

/// Section reported when there is nothing to vote on
pub const UNKNOWN_SECTION: &str = "unknown";

/// Number of leading results that vote in [`majority_section`]
pub const SECTION_VOTE_DEPTH: usize = 3;

fn hits_in_top_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> usize {
    retrieved
        .iter()
        .take(k)
        .filter(|doc| relevant.contains(*doc))
        .count()
}

#[must_use]
pub fn precision_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if k == 0 {
        return 0.0;
    }
    hits_in_top_k(retrieved, relevant, k) as f64 / k as f64
}

#[must_use]
pub fn recall_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if relevant.is_empty() {
        return 0.0;
    }
    hits_in_top_k(retrieved, relevant, k) as f64 / relevant.len() as f64
}

#[must_use]
pub fn hit_rate_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    if hits_in_top_k(retrieved, relevant, k) > 0 {
        1.0
    } else {
        0.0
    }
}

/// `1 / rank` of the first relevant document within the top `k` (1-based), else 0
#[must_use]
pub fn reciprocal_rank_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    retrieved
        .iter()
        .take(k)
        .position(|doc| relevant.contains(doc))
        .map_or(0.0, |idx| 1.0 / (idx + 1) as f64)
}

/// Binary-gain nDCG; the ideal ranking puts `min(|relevant|, k)` relevant documents first
#[must_use]
pub fn ndcg_at_k(retrieved: &[&str], relevant: &HashSet<&str>, k: usize) -> f64 {
    let dcg: f64 = retrieved
        .iter()
        .take(k)
        .enumerate()
        .filter(|(_, doc)| relevant.contains(*doc))
        .map(|(idx, _)| discount(idx + 1))
        .sum();
    let ideal: f64 = (1..=relevant.len().min(k)).map(discount).sum();
    if ideal == 0.0 {
        return 0.0;
    }
    dcg / ideal
}

fn discount(position: usize) -> f64 {
    1.0 / ((position + 1) as f64).log2()
}

/// Most frequent section among the top results; ties go to the section seen first
#[must_use]
pub fn majority_section(results: &[RetrievalResult]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for result in results.iter().take(SECTION_VOTE_DEPTH) {
        let section = result.section.as_str();
        match counts.iter_mut().find(|(name, _)| *name == section) {
            Some((_, count)) => *count += 1,
            None => counts.push((section, 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (section, count) in counts {
        if best.map_or(true, |(_, top)| count > top) {
            best = Some((section, count));
        }
    }
    best.map_or_else(|| UNKNOWN_SECTION.to_string(), |(section, _)| section.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_chunker::Section;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const EPS: f64 = 1e-12;

    fn set<'a>(items: &[&'a str]) -> HashSet<&'a str> {
        items.iter().copied().collect()
    }

    fn result(section: Section) -> RetrievalResult {
        RetrievalResult {
            chunk_id: 0,
            source_url: "u".to_string(),
            title: String::new(),
            section,
            text: String::new(),
            score: 0.0,
        }
    }

    #[test]
    fn worked_example_at_three() {
        let retrieved = ["a", "b", "c", "d", "e"];
        let relevant = set(&["b", "d"]);
        assert!((precision_at_k(&retrieved, &relevant, 3) - 1.0 / 3.0).abs() < EPS);
        assert!((recall_at_k(&retrieved, &relevant, 3) - 0.5).abs() < EPS);
        assert!((hit_rate_at_k(&retrieved, &relevant, 3) - 1.0).abs() < EPS);
        assert!((reciprocal_rank_at_k(&retrieved, &relevant, 3) - 0.5).abs() < EPS);

        // dcg = 1/log2(3); ideal = 1 + 1/log2(3)
        let expected = (1.0 / 3f64.log2()) / (1.0 + 1.0 / 3f64.log2());
        assert!((ndcg_at_k(&retrieved, &relevant, 3) - expected).abs() < EPS);
    }

    #[test]
    fn empty_relevant_set_scores_zero() {
        let retrieved = ["a", "b"];
        let relevant = HashSet::new();
        for k in [0, 1, 2, 5] {
            assert_eq!(recall_at_k(&retrieved, &relevant, k), 0.0);
            assert_eq!(ndcg_at_k(&retrieved, &relevant, k), 0.0);
            assert_eq!(precision_at_k(&retrieved, &relevant, k), 0.0);
            assert_eq!(reciprocal_rank_at_k(&retrieved, &relevant, k), 0.0);
        }
    }

    #[test]
    fn zero_cutoff_is_zero() {
        let retrieved = ["a"];
        let relevant = set(&["a"]);
        assert_eq!(precision_at_k(&retrieved, &relevant, 0), 0.0);
        assert_eq!(hit_rate_at_k(&retrieved, &relevant, 0), 0.0);
        assert_eq!(ndcg_at_k(&retrieved, &relevant, 0), 0.0);
    }

    #[test]
    fn short_ranking_uses_fixed_denominator() {
        let retrieved = ["a"];
        let relevant = set(&["a"]);
        assert!((precision_at_k(&retrieved, &relevant, 5) - 0.2).abs() < EPS);
        assert!((ndcg_at_k(&retrieved, &relevant, 5) - 1.0).abs() < EPS);
    }

    #[test]
    fn perfect_ranking_has_unit_ndcg() {
        let retrieved = ["r1", "r2", "r3", "x", "y"];
        let relevant = set(&["r1", "r2", "r3"]);
        for k in [1, 3, 5] {
            assert!((ndcg_at_k(&retrieved, &relevant, k) - 1.0).abs() < EPS, "k={k}");
        }
    }

    #[test]
    fn duplicate_documents_are_counted_per_occurrence() {
        // Known quirk: two chunks of the same relevant page both count.
        let retrieved = ["a", "a", "b"];
        let relevant = set(&["a"]);
        assert!((precision_at_k(&retrieved, &relevant, 3) - 2.0 / 3.0).abs() < EPS);
        assert!((recall_at_k(&retrieved, &relevant, 3) - 2.0).abs() < EPS);
        assert!(ndcg_at_k(&retrieved, &relevant, 3) > 1.0);
    }

    #[test]
    fn majority_section_votes_over_top_three() {
        assert_eq!(majority_section(&[]), UNKNOWN_SECTION);
        assert_eq!(
            majority_section(&[
                result(Section::Billing),
                result(Section::Claims),
                result(Section::Claims),
                result(Section::Billing),
                result(Section::Billing),
            ]),
            "claims"
        );
        // Tie: first seen wins.
        assert_eq!(
            majority_section(&[
                result(Section::Agent),
                result(Section::Contact),
                result(Section::General),
            ]),
            "agent"
        );
    }

    proptest! {
        #[test]
        fn ndcg_ignores_relevant_set_order(
            retrieved in proptest::collection::vec(0u8..12, 0..10),
            relevant in proptest::collection::vec(0u8..12, 0..8),
            k in 0usize..12,
        ) {
            let names: Vec<String> = (0..12).map(|i| format!("d{i}")).collect();
            let retrieved: Vec<&str> = retrieved.iter().map(|&i| names[i as usize].as_str()).collect();
            let forward: HashSet<&str> = relevant.iter().map(|&i| names[i as usize].as_str()).collect();
            let backward: HashSet<&str> = relevant.iter().rev().map(|&i| names[i as usize].as_str()).collect();

            let a = ndcg_at_k(&retrieved, &forward, k);
            let b = ndcg_at_k(&retrieved, &backward, k);
            prop_assert!((a - b).abs() < EPS);
            prop_assert!(a >= 0.0);
        }

        #[test]
        fn metrics_are_bounded_without_duplicates(
            order in Just((0..10).collect::<Vec<usize>>()).prop_shuffle(),
            relevant in proptest::collection::hash_set(0usize..10, 0..6),
            k in 0usize..12,
        ) {
            let names: Vec<String> = (0..10).map(|i| format!("d{i}")).collect();
            let retrieved: Vec<&str> = order.iter().map(|&i| names[i].as_str()).collect();
            let relevant: HashSet<&str> = relevant.iter().map(|&i| names[i].as_str()).collect();
            for value in [
                precision_at_k(&retrieved, &relevant, k),
                recall_at_k(&retrieved, &relevant, k),
                hit_rate_at_k(&retrieved, &relevant, k),
                reciprocal_rank_at_k(&retrieved, &relevant, k),
                ndcg_at_k(&retrieved, &relevant, k),
            ] {
                prop_assert!((0.0..=1.0 + EPS).contains(&value));
            }
        }
    }
}
