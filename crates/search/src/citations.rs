//! What a retrieval hands to the answer-generation step: deduplicated citations and the ordered
//! passages the answer must be grounded in.

use crate::types::RetrievalResult;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write as _;

pub const DEFAULT_MAX_CITATIONS: usize = 3;

const UNTITLED_SOURCE: &str = "Source";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub title: String,
    pub url: String,
}

/// Unique source URLs in rank order, at most `max`
#[must_use]
pub fn format_citations(results: &[RetrievalResult], max: usize) -> Vec<Citation> {
    let mut seen = HashSet::new();
    let mut citations = Vec::new();
    for result in results {
        if citations.len() >= max {
            break;
        }
        if result.source_url.is_empty() || !seen.insert(result.source_url.as_str()) {
            continue;
        }
        let title = if result.title.trim().is_empty() {
            UNTITLED_SOURCE.to_string()
        } else {
            result.title.clone()
        };
        citations.push(Citation {
            title,
            url: result.source_url.clone(),
        });
    }
    citations
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    pub title: String,
    pub source_url: String,
    pub text: String,
}

/// The question and its ranked supporting passages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationContext {
    pub query: String,
    pub passages: Vec<Passage>,
}

impl GenerationContext {
    #[must_use]
    pub fn new(query: impl Into<String>, results: &[RetrievalResult]) -> Self {
        Self {
            query: query.into(),
            passages: results
                .iter()
                .map(|result| Passage {
                    title: result.title.clone(),
                    source_url: result.source_url.clone(),
                    text: result.text.clone(),
                })
                .collect(),
        }
    }

    /// Plain-text source listing for a prompt, one block per passage
    #[must_use]
    pub fn sources_block(&self) -> String {
        let mut out = String::new();
        for passage in &self.passages {
            let _ = writeln!(out, "- Title: {}", passage.title);
            let _ = writeln!(out, "  URL: {}", passage.source_url);
            let _ = writeln!(out, "  Excerpt: {}", passage.text);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docqa_chunker::Section;
    use pretty_assertions::assert_eq;

    fn result(id: usize, url: &str, title: &str) -> RetrievalResult {
        RetrievalResult {
            chunk_id: id,
            source_url: url.to_string(),
            title: title.to_string(),
            section: Section::General,
            text: format!("text {id}"),
            score: 1.0 - id as f32 * 0.1,
        }
    }

    #[test]
    fn citations_are_unique_and_capped() {
        let results = vec![
            result(0, "https://a", "A"),
            result(1, "https://a", "A"),
            result(2, "https://b", ""),
            result(3, "", "Nothing"),
            result(4, "https://c", "C"),
            result(5, "https://d", "D"),
        ];
        let citations = format_citations(&results, DEFAULT_MAX_CITATIONS);
        assert_eq!(
            citations,
            vec![
                Citation {
                    title: "A".to_string(),
                    url: "https://a".to_string()
                },
                Citation {
                    title: "Source".to_string(),
                    url: "https://b".to_string()
                },
                Citation {
                    title: "C".to_string(),
                    url: "https://c".to_string()
                },
            ]
        );
        assert!(format_citations(&results, 0).is_empty());
    }

    #[test]
    fn blank_titles_are_cited_as_source() {
        let citations = format_citations(&[result(0, "https://a", "  \t")], 1);
        assert_eq!(citations[0].title, "Source");
        assert_eq!(citations[0].url, "https://a");
    }

    #[test]
    fn generation_context_keeps_rank_order() {
        let results = vec![result(1, "https://b", "B"), result(0, "https://a", "A")];
        let context = GenerationContext::new("how?", &results);
        assert_eq!(context.query, "how?");
        let urls: Vec<&str> = context
            .passages
            .iter()
            .map(|p| p.source_url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://b", "https://a"]);
        assert!(context
            .sources_block()
            .starts_with("- Title: B\n  URL: https://b\n  Excerpt: text 1\n"));
    }
}
