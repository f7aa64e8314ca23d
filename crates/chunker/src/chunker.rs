use crate::config::ChunkerConfig;
use crate::error::{ChunkerError, Result};
use crate::types::{DocumentChunk, Section};

/// Splits document text into overlapping word windows
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate().map_err(ChunkerError::invalid_config)?;
        Ok(Self { config })
    }

    #[must_use]
    pub const fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Split text into windows of at most `chunk_words` words.
    ///
    /// Consecutive windows share `overlap_words` words; the window that reaches the last word ends
    /// the sequence. Empty or whitespace-only text yields no windows.
    #[must_use]
    pub fn split(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        if words.is_empty() {
            return Vec::new();
        }

        let size = self.config.chunk_words.max(1);
        let mut windows = Vec::with_capacity(words.len() / self.config.stride() + 1);
        let mut start = 0;
        while start < words.len() {
            let end = (start + size).min(words.len());
            windows.push(words[start..end].join(" "));
            if end == words.len() {
                break;
            }
            // Clamp so the start always advances, whatever the overlap.
            start = end.saturating_sub(self.config.overlap_words).max(start + 1);
        }
        windows
    }

    /// Split one document and tag every window with its provenance
    #[must_use]
    pub fn chunk_document(&self, source_url: &str, title: &str, text: &str) -> Vec<DocumentChunk> {
        let section = Section::from_url(source_url);
        let windows = self.split(text);
        log::debug!(
            "Chunked {source_url} into {} windows (section {section})",
            windows.len()
        );
        windows
            .into_iter()
            .map(|text| DocumentChunk {
                source_url: source_url.to_string(),
                title: title.to_string(),
                section,
                text,
            })
            .collect()
    }
}

impl Default for Chunker {
    fn default() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }
}
