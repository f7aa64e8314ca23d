use serde::{Deserialize, Serialize};
use std::fmt;

/// A passage of a source document, the unit of retrieval.
///
/// `chunk_id` is assigned when the chunk joins a chunk set and equals its row position there and
/// in the vector index built alongside it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Dense 0-based id, stable within one build
    pub chunk_id: usize,

    /// Identifier of the source document (its URL)
    pub source_url: String,

    /// Title of the source document
    #[serde(default)]
    pub title: String,

    /// Coarse category inferred from the URL
    #[serde(default)]
    pub section: Section,

    /// Window content
    pub text: String,
}

impl Chunk {
    /// Attach an id to a document window
    #[must_use]
    pub fn from_document_chunk(chunk_id: usize, chunk: DocumentChunk) -> Self {
        Self {
            chunk_id,
            source_url: chunk.source_url,
            title: chunk.title,
            section: chunk.section,
            text: chunk.text,
        }
    }

    /// Number of whitespace-separated words in this chunk
    #[must_use]
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

/// A window produced from one document before ids are assigned
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentChunk {
    pub source_url: String,
    pub title: String,
    pub section: Section,
    pub text: String,
}

/// Coarse document category inferred from the URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    Claims,
    Billing,
    Agent,
    Contact,
    #[default]
    #[serde(other)]
    General,
}

/// Ordered keyword table; the first keyword contained in the URL decides the section.
const SECTION_KEYWORDS: &[(&str, Section)] = &[
    ("claim", Section::Claims),
    ("pay", Section::Billing),
    ("bill", Section::Billing),
    ("agent", Section::Agent),
    ("contact", Section::Contact),
];

impl Section {
    /// Infer the section from a URL (case-insensitive substring match, first match wins)
    #[must_use]
    pub fn from_url(url: &str) -> Self {
        let lowered = url.to_lowercase();
        SECTION_KEYWORDS
            .iter()
            .find(|(keyword, _)| lowered.contains(keyword))
            .map_or(Self::General, |(_, section)| *section)
    }

    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Claims => "claims",
            Self::Billing => "billing",
            Self::Agent => "agent",
            Self::Contact => "contact",
            Self::General => "general",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
