use serde::{Deserialize, Serialize};

pub const DEFAULT_CHUNK_WORDS: usize = 350;
pub const DEFAULT_OVERLAP_WORDS: usize = 80;

/// Configuration for passage windowing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum number of words per window
    pub chunk_words: usize,

    /// Number of trailing words repeated at the start of the next window
    pub overlap_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_words: DEFAULT_CHUNK_WORDS,
            overlap_words: DEFAULT_OVERLAP_WORDS,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub const fn new(chunk_words: usize, overlap_words: usize) -> Self {
        Self {
            chunk_words,
            overlap_words,
        }
    }

    /// Number of words the window start moves forward after each window.
    ///
    /// Never less than one, so an overlap at or above the window size still makes progress.
    #[must_use]
    pub const fn stride(&self) -> usize {
        let stride = self.chunk_words.saturating_sub(self.overlap_words);
        if stride == 0 {
            1
        } else {
            stride
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_words == 0 {
            return Err("chunk_words must be > 0".to_string());
        }
        Ok(())
    }
}
