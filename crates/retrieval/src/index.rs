//! Flat (exhaustive) vector index.
//!
//! Persisted as JSON:
//!
//! ```json
//! { "metric": "l2", "dimension": 384, "vectors": [[0.01, ...], ...] }
//! ```
//!
//! Row `i` corresponds to the `i`-th record of the document store. Search
//! scans every row, which matches a flat FAISS index and is plenty for a
//! wiki-sized corpus.

use std::path::Path;

use delver_core::error::{IndexLoadError, RetrievalError};
use serde::{Deserialize, Serialize};

use crate::vector::{inner_product, l2_distance_squared};

/// How neighbors are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Squared Euclidean distance, smaller is closer.
    #[default]
    L2,
    /// Dot product, larger is closer (use with normalized vectors).
    InnerProduct,
}

impl Metric {
    fn score(self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            Metric::L2 => l2_distance_squared(a, b),
            Metric::InnerProduct => inner_product(a, b),
        }
    }

    fn lower_is_closer(self) -> bool {
        matches!(self, Metric::L2)
    }
}

/// One search result: the row in the index and its metric score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlatIndex {
    #[serde(default)]
    metric: Metric,
    dimension: usize,
    #[serde(default)]
    vectors: Vec<Vec<f32>>,
}

impl FlatIndex {
    pub fn new(metric: Metric, dimension: usize) -> Self {
        Self {
            metric,
            dimension,
            vectors: Vec::new(),
        }
    }

    /// Append a row.
    pub fn add(&mut self, vector: Vec<f32>) -> Result<(), RetrievalError> {
        if vector.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
            });
        }
        self.vectors.push(vector);
        Ok(())
    }

    /// Read and validate an index file.
    pub fn load(path: &Path) -> Result<Self, IndexLoadError> {
        if !path.exists() {
            return Err(IndexLoadError::Missing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| IndexLoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let index: Self = serde_json::from_str(&content).map_err(|e| IndexLoadError::Malformed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        index.validate().map_err(|reason| IndexLoadError::Malformed {
            path: path.to_path_buf(),
            reason,
        })?;

        Ok(index)
    }

    /// Write the index as JSON.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)
    }

    fn validate(&self) -> Result<(), String> {
        if self.dimension == 0 {
            return Err("dimension must be > 0".into());
        }
        if let Some((row, v)) = self
            .vectors
            .iter()
            .enumerate()
            .find(|(_, v)| v.len() != self.dimension)
        {
            return Err(format!(
                "row {row} has {} components, expected {}",
                v.len(),
                self.dimension
            ));
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// The `k` nearest rows, closest first. Ties keep row order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, RetrievalError> {
        if query.len() != self.dimension {
            return Err(RetrievalError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut scored: Vec<Neighbor> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(row, v)| Neighbor {
                row,
                score: self.metric.score(v, query),
            })
            .collect();

        let ascending = self.metric.lower_is_closer();
        scored.sort_by(|a, b| {
            let ord = a
                .score
                .partial_cmp(&b.score)
                .unwrap_or(std::cmp::Ordering::Equal);
            if ascending { ord } else { ord.reverse() }
        });
        scored.truncate(k);
        Ok(scored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(metric: Metric, rows: &[[f32; 2]]) -> FlatIndex {
        let mut idx = FlatIndex::new(metric, 2);
        for r in rows {
            idx.add(r.to_vec()).unwrap();
        }
        idx
    }

    #[test]
    fn l2_ranks_nearest_first() {
        let idx = index(Metric::L2, &[[5.0, 5.0], [0.1, 0.0], [1.0, 1.0]]);
        let hits = idx.search(&[0.0, 0.0], 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].row, 1);
        assert_eq!(hits[1].row, 2);
    }

    #[test]
    fn inner_product_ranks_largest_first() {
        let idx = index(Metric::InnerProduct, &[[0.0, 1.0], [1.0, 0.0], [0.7, 0.7]]);
        let hits = idx.search(&[1.0, 0.0], 3).unwrap();
        assert_eq!(hits.iter().map(|h| h.row).collect::<Vec<_>>(), vec![1, 2, 0]);
    }

    #[test]
    fn ties_keep_row_order() {
        let idx = index(Metric::L2, &[[1.0, 0.0], [1.0, 0.0], [1.0, 0.0]]);
        let hits = idx.search(&[0.0, 0.0], 3).unwrap();
        assert_eq!(hits.iter().map(|h| h.row).collect::<Vec<_>>(), vec![0, 1, 2]);
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let idx = index(Metric::L2, &[[1.0, 0.0]]);
        assert_eq!(idx.search(&[0.0, 0.0], 10).unwrap().len(), 1);
    }

    #[test]
    fn empty_index_returns_nothing() {
        let idx = FlatIndex::new(Metric::L2, 2);
        assert!(idx.search(&[0.0, 0.0], 5).unwrap().is_empty());
    }

    #[test]
    fn query_dimension_must_match() {
        let idx = index(Metric::L2, &[[1.0, 0.0]]);
        let err = idx.search(&[0.0, 0.0, 0.0], 1).unwrap_err();
        assert!(matches!(err, RetrievalError::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn add_rejects_wrong_dimension() {
        let mut idx = FlatIndex::new(Metric::L2, 2);
        assert!(idx.add(vec![1.0]).is_err());
        assert!(idx.is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wiki.index.json");
        let idx = index(Metric::InnerProduct, &[[1.0, 0.0], [0.0, 1.0]]);
        idx.save(&path).unwrap();

        let loaded = FlatIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimension(), 2);
        assert_eq!(loaded.metric(), Metric::InnerProduct);
    }

    #[test]
    fn load_missing_file() {
        let err = FlatIndex::load(Path::new("/nonexistent/wiki.index.json")).unwrap_err();
        assert!(matches!(err, IndexLoadError::Missing(_)));
    }

    #[test]
    fn load_rejects_ragged_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragged.json");
        std::fs::write(&path, r#"{"dimension": 2, "vectors": [[1.0, 0.0], [1.0]]}"#).unwrap();
        let err = FlatIndex::load(&path).unwrap_err();
        assert!(matches!(err, IndexLoadError::Malformed { .. }));
        assert!(err.to_string().contains("row 1"));
    }

    #[test]
    fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.json");
        std::fs::write(&path, b"\x00\x01faiss").unwrap();
        assert!(matches!(
            FlatIndex::load(&path).unwrap_err(),
            IndexLoadError::Malformed { .. }
        ));
    }
}
