//! Document store: the text side of the wiki index.
//!
//! The store file is a JSON object mapping document keys to records:
//!
//! ```json
//! {
//!   "_global_counts": { "...": 0 },
//!   "Fountain": { "title": "Fountain", "raw_text": "A fountain is ..." }
//! }
//! ```
//!
//! Key order is significant: the `i`-th remaining key is row `i` of the
//! vector index. The reserved `_global_counts` entry holds corpus statistics
//! written by the index builder and is never a search result.

use std::path::Path;

use delver_core::error::IndexLoadError;
use serde::{Deserialize, Serialize};

/// Reserved aggregate key dropped at load time.
pub const GLOBAL_COUNTS_KEY: &str = "_global_counts";

/// One wiki page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRecord {
    #[serde(default)]
    pub title: String,

    pub raw_text: String,

    /// Embedding kept by some index builders; the flat index is authoritative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl DocumentRecord {
    pub fn new(title: impl Into<String>, raw_text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            raw_text: raw_text.into(),
            embedding: None,
        }
    }
}

/// Ordered key → record mapping, read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    keys: Vec<String>,
    records: Vec<DocumentRecord>,
}

impl DocumentStore {
    /// Build a store from `(key, record)` pairs in row order.
    pub fn from_records<I, K>(records: I) -> Self
    where
        I: IntoIterator<Item = (K, DocumentRecord)>,
        K: Into<String>,
    {
        let mut store = Self::default();
        for (key, record) in records {
            let key = key.into();
            if key == GLOBAL_COUNTS_KEY {
                continue;
            }
            store.keys.push(key);
            store.records.push(record);
        }
        store
    }

    /// Read a store file, dropping the reserved aggregate key.
    pub fn load(path: &Path) -> Result<Self, IndexLoadError> {
        if !path.exists() {
            return Err(IndexLoadError::Missing(path.to_path_buf()));
        }

        let content = std::fs::read_to_string(path).map_err(|e| IndexLoadError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::parse(&content).map_err(|reason| IndexLoadError::Malformed {
            path: path.to_path_buf(),
            reason,
        })
    }

    fn parse(content: &str) -> Result<Self, String> {
        // Map iteration follows file order (serde_json `preserve_order`).
        let raw: serde_json::Map<String, serde_json::Value> =
            serde_json::from_str(content).map_err(|e| e.to_string())?;

        let mut records = Vec::with_capacity(raw.len());
        for (key, value) in raw {
            if key == GLOBAL_COUNTS_KEY {
                continue;
            }
            let record: DocumentRecord = serde_json::from_value(value)
                .map_err(|e| format!("record '{key}': {e}"))?;
            records.push((key, record));
        }

        Ok(Self::from_records(records))
    }

    /// Write the store as a JSON object in row order.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        let mut map = serde_json::Map::new();
        for (key, record) in self.keys.iter().zip(&self.records) {
            map.insert(key.clone(), serde_json::to_value(record)?);
        }
        std::fs::write(path, serde_json::to_string(&map)?)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at an index row.
    pub fn get(&self, row: usize) -> Option<(&str, &DocumentRecord)> {
        let key = self.keys.get(row)?;
        let record = self.records.get(row)?;
        Some((key.as_str(), record))
    }

    pub fn get_by_key(&self, key: &str) -> Option<&DocumentRecord> {
        let row = self.keys.iter().position(|k| k == key)?;
        self.records.get(row)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().map(String::as_str)
    }
}
