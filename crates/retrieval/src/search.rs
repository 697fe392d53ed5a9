//! `WikiSearch` — the retriever the agent consults for strategy advice.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use delver_config::AgentSettings;
use delver_core::error::{IndexLoadError, RetrievalError};
use delver_core::retrieval::{Embedder, Retriever};
use tracing::{debug, info};

use crate::index::FlatIndex;
use crate::store::DocumentStore;

/// Query encoded by [`WikiSearch::verify_embedder`].
const EMBEDDER_SAMPLE: &str = "fountain";

/// One ranked document.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub key: String,
    pub title: String,
    pub raw_text: String,
    /// Metric score from the index (distance for L2, similarity otherwise).
    pub score: f32,
}

/// Both artifacts, present together or not at all.
struct LoadedIndex {
    index: FlatIndex,
    store: DocumentStore,
}

/// Nearest-neighbor search over the NetHack wiki.
pub struct WikiSearch {
    index_path: PathBuf,
    store_path: PathBuf,
    top_k: usize,
    embedder: Arc<dyn Embedder>,
    loaded: Option<LoadedIndex>,
}

impl std::fmt::Debug for WikiSearch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WikiSearch")
            .field("index_path", &self.index_path)
            .field("store_path", &self.store_path)
            .field("top_k", &self.top_k)
            .field("loaded", &self.loaded.is_some())
            .finish_non_exhaustive()
    }
}

impl WikiSearch {
    pub fn new(
        index_path: impl Into<PathBuf>,
        store_path: impl Into<PathBuf>,
        top_k: usize,
        embedder: Arc<dyn Embedder>,
    ) -> Self {
        Self {
            index_path: index_path.into(),
            store_path: store_path.into(),
            top_k,
            embedder,
            loaded: None,
        }
    }

    pub fn from_settings(settings: &AgentSettings, embedder: Arc<dyn Embedder>) -> Self {
        Self::new(
            &settings.index_path,
            &settings.store_path,
            settings.top_k,
            embedder,
        )
    }

    /// Load the index and the store. Idempotent.
    ///
    /// Nothing is kept unless both artifacts load and agree with each other:
    /// every index row needs a store record, and a declared embedder
    /// dimension must match the index.
    pub fn load(&mut self) -> Result<(), IndexLoadError> {
        if self.loaded.is_some() {
            return Ok(());
        }

        let index = FlatIndex::load(&self.index_path)?;
        let store = DocumentStore::load(&self.store_path)?;

        if index.len() > store.len() {
            return Err(IndexLoadError::Inconsistent(format!(
                "index has {} rows but store has {} records",
                index.len(),
                store.len()
            )));
        }

        if let Some(dim) = self.embedder.dimension()
            && dim != index.dimension()
        {
            return Err(IndexLoadError::Inconsistent(format!(
                "embedder produces {dim}-d vectors, index is {}-d",
                index.dimension()
            )));
        }

        info!(
            index = %self.index_path.display(),
            documents = store.len(),
            rows = index.len(),
            dimension = index.dimension(),
            "Wiki index loaded"
        );

        self.loaded = Some(LoadedIndex { index, store });
        Ok(())
    }

    /// Encode a sample query and check it against the loaded index.
    ///
    /// Catches an `embedding_model` that differs from the one the index was
    /// built with, which would otherwise only surface as failed searches.
    pub async fn verify_embedder(&self) -> delver_core::Result<usize> {
        let loaded = self.loaded.as_ref().ok_or(RetrievalError::NotLoaded)?;

        let sample = self.embedder.encode(EMBEDDER_SAMPLE).await?;
        let expected = loaded.index.dimension();
        if sample.len() != expected {
            return Err(IndexLoadError::Inconsistent(format!(
                "embedder produces {}-d vectors, index is {expected}-d",
                sample.len()
            ))
            .into());
        }

        debug!(dimension = expected, "Embedder matches index");
        Ok(expected)
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    /// Number of searchable documents, once loaded.
    pub fn document_count(&self) -> Option<usize> {
        self.loaded.as_ref().map(|l| l.index.len())
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn index_path(&self) -> &Path {
        &self.index_path
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }

    /// Ranked hits with titles and scores.
    pub async fn search_records(&self, query: &str) -> Result<Vec<SearchHit>, RetrievalError> {
        self.search_top(query, self.top_k).await
    }

    /// Like [`search_records`](Self::search_records) with an explicit `k`.
    pub async fn search_top(&self, query: &str, k: usize) -> Result<Vec<SearchHit>, RetrievalError> {
        let loaded = self.loaded.as_ref().ok_or(RetrievalError::NotLoaded)?;

        let embedding = self.embedder.encode(query).await?;
        let neighbors = loaded.index.search(&embedding, k)?;

        let hits = neighbors
            .into_iter()
            .map(|n| {
                let (key, record) = loaded.store.get(n.row).ok_or_else(|| {
                    RetrievalError::Search(format!("index row {} has no document", n.row))
                })?;
                Ok(SearchHit {
                    key: key.to_string(),
                    title: record.title.clone(),
                    raw_text: record.raw_text.clone(),
                    score: n.score,
                })
            })
            .collect::<Result<Vec<_>, RetrievalError>>()?;

        debug!(query, hits = hits.len(), "Wiki search complete");
        Ok(hits)
    }
}

#[async_trait]
impl Retriever for WikiSearch {
    async fn search(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        let hits = self.search_records(query).await?;
        Ok(hits.into_iter().map(|h| h.raw_text).collect())
    }
}
