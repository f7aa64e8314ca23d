use crate::error::{EvalError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One labeled query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvalQuery {
    pub id: String,
    pub query: String,
    /// Document URLs that answer the query
    #[serde(default)]
    pub relevant_urls: Vec<String>,
    /// Expected section name, when labeled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[derive(Deserialize)]
struct RawEvalQuery {
    id: Option<String>,
    query: String,
    #[serde(default)]
    relevant_urls: Vec<String>,
    #[serde(default)]
    section: Option<String>,
}

/// Load a JSON Lines evaluation set.
///
/// Blank lines are skipped; a record without `id` is named `row{n}` after its 1-based position
/// among the records.
pub async fn load_queries(path: impl AsRef<Path>) -> Result<Vec<EvalQuery>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await?;
    let queries = parse_queries(&raw, &path.display().to_string())?;
    log::info!("Loaded {} evaluation queries from {}", queries.len(), path.display());
    Ok(queries)
}

pub fn parse_queries(raw: &str, origin: &str) -> Result<Vec<EvalQuery>> {
    let mut queries = Vec::new();
    for (line_no, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: RawEvalQuery =
            serde_json::from_str(line).map_err(|e| EvalError::Dataset {
                location: format!("{origin}:{}", line_no + 1),
                message: e.to_string(),
            })?;
        let id = record
            .id
            .unwrap_or_else(|| format!("row{}", queries.len() + 1));
        queries.push(EvalQuery {
            id,
            query: record.query,
            relevant_urls: record.relevant_urls,
            section: record.section.filter(|s| !s.is_empty()),
        });
    }
    Ok(queries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_fill_missing_fields() {
        let raw = concat!(
            r#"{"id":"q-claims","query":"how do I file a claim","relevant_urls":["https://a/claims"],"section":"claims"}"#,
            "\n\n",
            r#"{"query":"where is my bill"}"#,
            "\n",
            r#"{"query":"agent near me","section":""}"#,
            "\n",
        );
        let queries = parse_queries(raw, "eval.jsonl").unwrap();
        assert_eq!(queries.len(), 3);
        assert_eq!(queries[0].id, "q-claims");
        assert_eq!(queries[0].section.as_deref(), Some("claims"));
        assert_eq!(queries[1].id, "row2");
        assert!(queries[1].relevant_urls.is_empty());
        assert_eq!(queries[1].section, None);
        assert_eq!(queries[2].id, "row3");
        assert_eq!(queries[2].section, None);
    }

    #[test]
    fn malformed_record_names_its_line() {
        let err = parse_queries("{\"query\":\"ok\"}\n{\"id\":\"x\"}\n", "eval.jsonl").unwrap_err();
        match err {
            EvalError::Dataset { location, .. } => assert_eq!(location, "eval.jsonl:2"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn empty_input_is_empty_set() {
        assert!(parse_queries("\n  \n", "eval.jsonl").unwrap().is_empty());
    }
}
