use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_DIR: &str = "index";

pub const VECTORS_FILE_NAME: &str = "vectors.bin";
pub const CHUNKS_FILE_NAME: &str = "chunks.jsonl";
pub const MANIFEST_FILE_NAME: &str = "manifest.json";
pub const EVAL_REPORT_FILE_NAME: &str = "retrieval_eval_report.json";

const STAGING_SUFFIX: &str = ".staging";
const RETIRED_SUFFIX: &str = ".retired";

/// File layout of one index directory.
///
/// Builds are written to a sibling staging directory and renamed into place, so the staging and
/// retired paths live next to the index directory rather than inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexLayout {
    dir: PathBuf,
}

impl IndexLayout {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn vectors_path(&self) -> PathBuf {
        self.dir.join(VECTORS_FILE_NAME)
    }

    #[must_use]
    pub fn chunks_path(&self) -> PathBuf {
        self.dir.join(CHUNKS_FILE_NAME)
    }

    #[must_use]
    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE_NAME)
    }

    #[must_use]
    pub fn eval_report_path(&self) -> PathBuf {
        self.dir.join(EVAL_REPORT_FILE_NAME)
    }

    /// Whether all three index files are present
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.vectors_path().is_file() && self.chunks_path().is_file() && self.manifest_path().is_file()
    }

    /// Layout of the directory a new build is written to before publishing
    #[must_use]
    pub fn staging(&self) -> Self {
        Self::new(self.sibling(STAGING_SUFFIX))
    }

    /// Where the previous live index is parked during a swap
    #[must_use]
    pub fn retired_dir(&self) -> PathBuf {
        self.sibling(RETIRED_SUFFIX)
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name: OsString = self
            .dir
            .file_name()
            .map_or_else(|| OsString::from(DEFAULT_INDEX_DIR), OsString::from);
        name.push(suffix);
        self.dir.with_file_name(name)
    }
}

impl Default for IndexLayout {
    fn default() -> Self {
        Self::new(DEFAULT_INDEX_DIR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn files_live_inside_the_index_dir() {
        let layout = IndexLayout::new("/data/index");
        assert_eq!(layout.vectors_path(), PathBuf::from("/data/index/vectors.bin"));
        assert_eq!(layout.chunks_path(), PathBuf::from("/data/index/chunks.jsonl"));
        assert_eq!(layout.manifest_path(), PathBuf::from("/data/index/manifest.json"));
        assert_eq!(
            layout.eval_report_path(),
            PathBuf::from("/data/index/retrieval_eval_report.json")
        );
    }

    #[test]
    fn staging_and_retired_are_siblings() {
        let layout = IndexLayout::new("/data/index");
        assert_eq!(layout.staging().dir(), Path::new("/data/index.staging"));
        assert_eq!(layout.retired_dir(), PathBuf::from("/data/index.retired"));

        let relative = IndexLayout::default();
        assert_eq!(relative.staging().dir(), Path::new("index.staging"));
    }
}
