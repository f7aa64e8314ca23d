use crate::error::{IndexerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Plain-text document produced by the extraction step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub text: String,
}

/// Documents read from a source plus the per-record failures that were skipped
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentBatch {
    pub documents: Vec<SourceDocument>,
    pub errors: Vec<String>,
}

impl DocumentBatch {
    #[must_use]
    pub fn new(documents: Vec<SourceDocument>) -> Self {
        Self {
            documents,
            errors: Vec::new(),
        }
    }

    /// Keep only documents whose URL is listed, in list order.
    ///
    /// Listed URLs without a document are logged and recorded as errors.
    #[must_use]
    pub fn restrict_to(self, urls: &[String]) -> Self {
        let mut by_url: HashMap<String, SourceDocument> = HashMap::new();
        for doc in self.documents {
            by_url.entry(doc.url.clone()).or_insert(doc);
        }

        let mut errors = self.errors;
        let mut documents = Vec::with_capacity(urls.len());
        let mut seen = HashSet::new();
        for url in urls {
            if !seen.insert(url.as_str()) {
                continue;
            }
            match by_url.remove(url) {
                Some(doc) => documents.push(doc),
                None => {
                    log::warn!("Listed URL has no extracted document: {url}");
                    errors.push(format!("{url}: no document"));
                }
            }
        }
        Self { documents, errors }
    }
}

/// Where build input comes from
#[async_trait]
pub trait DocumentSource: Send + Sync {
    async fn load(&self) -> Result<DocumentBatch>;

    /// Human-readable origin for logs
    fn describe(&self) -> String;
}

/// JSON Lines file of `{url, title?, text}` records.
///
/// Malformed lines and records without a URL are skipped with a warning.
#[derive(Debug, Clone)]
pub struct JsonlDocumentSource {
    path: PathBuf,
}

impl JsonlDocumentSource {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl DocumentSource for JsonlDocumentSource {
    async fn load(&self) -> Result<DocumentBatch> {
        let raw = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            IndexerError::Source(format!("failed to read {}: {e}", self.path.display()))
        })?;
        Ok(parse_documents(&raw, &self.path.display().to_string()))
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[async_trait]
impl DocumentSource for Vec<SourceDocument> {
    async fn load(&self) -> Result<DocumentBatch> {
        Ok(DocumentBatch::new(self.clone()))
    }

    fn describe(&self) -> String {
        format!("{} in-memory document(s)", self.len())
    }
}

fn parse_documents(raw: &str, origin: &str) -> DocumentBatch {
    let mut batch = DocumentBatch::default();
    for (line_no, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let location = format!("{origin}:{}", line_no + 1);
        match serde_json::from_str::<SourceDocument>(line) {
            Ok(doc) if doc.url.trim().is_empty() => {
                log::warn!("Skipping document without url at {location}");
                batch.errors.push(format!("{location}: missing url"));
            }
            Ok(doc) => batch.documents.push(doc),
            Err(err) => {
                log::warn!("Skipping malformed document at {location}: {err}");
                batch.errors.push(format!("{location}: {err}"));
            }
        }
    }
    batch
}

/// Read a URL list: one per line, blank lines and `#` comments ignored
pub async fn read_url_list(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path).await.map_err(|e| {
        IndexerError::Source(format!("failed to read URL list {}: {e}", path.display()))
    })?;
    Ok(parse_url_list(&raw))
}

fn parse_url_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn doc(url: &str) -> SourceDocument {
        SourceDocument {
            url: url.to_string(),
            title: String::new(),
            text: format!("text of {url}"),
        }
    }

    #[test]
    fn url_list_skips_comments_and_blanks() {
        let urls = parse_url_list("# seed pages\nhttps://a\n\n   https://b  \n#https://c\n");
        assert_eq!(urls, vec!["https://a".to_string(), "https://b".to_string()]);
    }

    #[test]
    fn malformed_lines_are_recorded_and_skipped() {
        let raw = concat!(
            r#"{"url":"https://a","title":"A","text":"alpha"}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"url":"  ","text":"orphan"}"#,
            "\n",
            r#"{"url":"https://b","text":"beta"}"#,
            "\n",
        );
        let batch = parse_documents(raw, "docs.jsonl");
        assert_eq!(batch.documents.len(), 2);
        assert_eq!(batch.documents[1].title, "");
        assert_eq!(batch.errors.len(), 2);
        assert!(batch.errors[0].starts_with("docs.jsonl:2:"));
        assert!(batch.errors[1].contains("missing url"));
    }

    #[test]
    fn restrict_follows_list_order_and_reports_missing() {
        let batch = DocumentBatch::new(vec![doc("https://a"), doc("https://b"), doc("https://c")]);
        let restricted = batch.restrict_to(&[
            "https://c".to_string(),
            "https://x".to_string(),
            "https://a".to_string(),
            "https://c".to_string(),
        ]);
        let urls: Vec<&str> = restricted
            .documents
            .iter()
            .map(|d| d.url.as_str())
            .collect();
        assert_eq!(urls, vec!["https://c", "https://a"]);
        assert_eq!(restricted.errors, vec!["https://x: no document".to_string()]);
    }

    #[tokio::test]
    async fn jsonl_source_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("docs.jsonl");
        std::fs::write(&path, "{\"url\":\"https://a\",\"text\":\"alpha\"}\n").unwrap();
        let source = JsonlDocumentSource::new(&path);
        let batch = source.load().await.unwrap();
        assert_eq!(batch.documents, vec![SourceDocument {
            url: "https://a".to_string(),
            title: String::new(),
            text: "alpha".to_string(),
        }]);

        let missing = JsonlDocumentSource::new(tmp.path().join("missing.jsonl"));
        assert!(matches!(
            missing.load().await.unwrap_err(),
            IndexerError::Source(_)
        ));
    }

    #[tokio::test]
    async fn read_url_list_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("urls.txt");
        std::fs::write(&path, "https://a\n# skip\nhttps://b\n").unwrap();
        assert_eq!(read_url_list(&path).await.unwrap().len(), 2);
    }
}
