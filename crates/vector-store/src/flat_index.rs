use crate::error::{Result, VectorStoreError};
use ndarray::{Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;

const MAGIC: &[u8; 4] = b"DQFX";
pub const FLAT_INDEX_FORMAT_VERSION: u32 = 1;
const HEADER_LEN: usize = 4 + 4 + 4 + 8;

/// One search hit: a row id and its inner-product score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub id: usize,
    pub score: f32,
}

/// Exact inner-product index over a dense row-major matrix.
///
/// Row `i` holds the vector of chunk `i`. The index is built once, persisted to a single binary
/// file and loaded read-only; there is no incremental insert.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatIndex {
    vectors: Array2<f32>,
}

impl FlatIndex {
    /// Build from rows that must all have `dimension` components
    pub fn build(dimension: usize, rows: &[Vec<f32>]) -> Result<Self> {
        if dimension == 0 && !rows.is_empty() {
            return Err(VectorStoreError::configuration(
                "cannot index vectors of dimension 0",
            ));
        }
        let mut flat = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            if row.len() != dimension {
                return Err(VectorStoreError::InvalidDimension {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            flat.extend_from_slice(row);
        }
        let vectors = Array2::from_shape_vec((rows.len(), dimension), flat)
            .map_err(|e| VectorStoreError::CorruptIndex(format!("shape error: {e}")))?;
        Ok(Self { vectors })
    }

    /// Build with the dimension taken from the first row
    pub fn from_vectors(rows: &[Vec<f32>]) -> Result<Self> {
        let dimension = rows.first().map_or(0, Vec::len);
        Self::build(dimension, rows)
    }

    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored vector of row `id`
    #[must_use]
    pub fn vector(&self, id: usize) -> Option<ArrayView1<'_, f32>> {
        (id < self.len()).then(|| self.vectors.row(id))
    }

    /// Top `top_k` rows by inner product with `query`.
    ///
    /// Scores descend; equal scores order by ascending id.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<Neighbor>> {
        if self.is_empty() {
            return Ok(Vec::new());
        }
        if query.len() != self.dimension() {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.dimension(),
                actual: query.len(),
            });
        }
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let scores = self.vectors.dot(&ArrayView1::from(query));
        let mut hits: Vec<Neighbor> = scores
            .iter()
            .enumerate()
            .map(|(id, &score)| Neighbor { id, score })
            .collect();
        hits.sort_by(compare_hits);
        hits.truncate(top_k);
        Ok(hits)
    }

    /// Persist to `path` (temporary file, then rename)
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let dimension = u32::try_from(self.dimension()).map_err(|_| {
            VectorStoreError::configuration(format!(
                "dimension {} does not fit the index format",
                self.dimension()
            ))
        })?;

        let mut bytes = Vec::with_capacity(HEADER_LEN + self.vectors.len() * 4);
        bytes.extend_from_slice(MAGIC);
        bytes.extend_from_slice(&FLAT_INDEX_FORMAT_VERSION.to_le_bytes());
        bytes.extend_from_slice(&dimension.to_le_bytes());
        bytes.extend_from_slice(&(self.len() as u64).to_le_bytes());
        for value in &self.vectors {
            bytes.extend_from_slice(&value.to_le_bytes());
        }

        let tmp = path.with_extension("bin.tmp");
        tokio::fs::write(&tmp, bytes).await?;
        tokio::fs::rename(&tmp, path).await?;
        log::debug!(
            "Saved flat index ({} x {}) to {}",
            self.len(),
            self.dimension(),
            path.display()
        );
        Ok(())
    }

    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        Self::decode(&bytes)
            .map_err(|e| VectorStoreError::CorruptIndex(format!("{}: {e}", path.display())))
    }

    fn decode(bytes: &[u8]) -> std::result::Result<Self, String> {
        if bytes.len() < HEADER_LEN {
            return Err(format!("file too short ({} bytes)", bytes.len()));
        }
        if &bytes[0..4] != MAGIC {
            return Err("bad magic".to_string());
        }
        let version = u32::from_le_bytes(read_array(&bytes[4..8]));
        if version != FLAT_INDEX_FORMAT_VERSION {
            return Err(format!(
                "unsupported format version {version} (expected {FLAT_INDEX_FORMAT_VERSION})"
            ));
        }
        let dimension = u32::from_le_bytes(read_array(&bytes[8..12])) as usize;
        let rows = usize::try_from(u64::from_le_bytes(read_array(&bytes[12..20])))
            .map_err(|_| "row count overflows usize".to_string())?;

        let payload = &bytes[HEADER_LEN..];
        let expected = rows
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| "header sizes overflow".to_string())?;
        if payload.len() != expected {
            return Err(format!(
                "payload is {} bytes, header promises {expected}",
                payload.len()
            ));
        }
        if dimension == 0 && rows > 0 {
            return Err("rows of dimension 0".to_string());
        }

        let values: Vec<f32> = payload
            .chunks_exact(4)
            .map(|raw| f32::from_le_bytes(read_array(raw)))
            .collect();
        let vectors =
            Array2::from_shape_vec((rows, dimension), values).map_err(|e| e.to_string())?;
        Ok(Self { vectors })
    }
}

fn compare_hits(a: &Neighbor, b: &Neighbor) -> Ordering {
    b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id))
}

fn read_array<const N: usize>(raw: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(&raw[..N]);
    out
}
