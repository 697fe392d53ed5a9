pub mod check;
pub mod init;
pub mod search;
pub mod step;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use delver_config::AppConfig;
use delver_core::provider::Provider;
use delver_retrieval::{ProviderEmbedder, WikiSearch};

pub fn config_path(explicit: Option<&Path>) -> PathBuf {
    explicit
        .map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(explicit: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let path = config_path(explicit);
    AppConfig::load_from(&path).map_err(|e| format!("Failed to load config: {e}").into())
}

/// Wiki search over the configured artifacts, loaded and checked against
/// the configured embedding model.
pub async fn load_wiki(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
) -> Result<WikiSearch, Box<dyn std::error::Error>> {
    let mut embedder = ProviderEmbedder::new(provider, &config.agent.embedding_model);
    if let Some(dimension) = config.agent.embedding_dimension {
        embedder = embedder.with_dimension(dimension);
    }

    let mut wiki = WikiSearch::from_settings(&config.agent, Arc::new(embedder));
    wiki.load()?;
    wiki.verify_embedder().await?;
    Ok(wiki)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use delver_core::error::ProviderError;
    use delver_core::message::Message;
    use delver_core::provider::{
        EmbeddingRequest, EmbeddingResponse, ProviderRequest, ProviderResponse,
    };
    use delver_retrieval::{DocumentRecord, DocumentStore, FlatIndex, Metric};

    /// Embeddings of a fixed size; chat is never used.
    struct FixedEmbeddings {
        dimension: usize,
        embed_calls: AtomicUsize,
    }

    impl FixedEmbeddings {
        fn new(dimension: usize) -> Arc<Self> {
            Arc::new(Self {
                dimension,
                embed_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl Provider for FixedEmbeddings {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> Result<ProviderResponse, ProviderError> {
            Ok(ProviderResponse {
                message: Message::assistant(""),
                usage: None,
                model: "fixed".into(),
            })
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            self.embed_calls.fetch_add(1, Ordering::Relaxed);
            Ok(EmbeddingResponse {
                embeddings: request
                    .inputs
                    .iter()
                    .map(|_| vec![0.5; self.dimension])
                    .collect(),
                model: request.model,
                usage: None,
            })
        }
    }

    fn config_with_wiki(dir: &Path, index_dimension: usize) -> AppConfig {
        let mut config = AppConfig::default();
        config.agent.index_path = dir.join("wiki.index.json");
        config.agent.store_path = dir.join("wiki.store.json");

        let mut index = FlatIndex::new(Metric::L2, index_dimension);
        index.add(vec![0.5; index_dimension]).unwrap();
        index.save(&config.agent.index_path).unwrap();
        DocumentStore::from_records([("Altar", DocumentRecord::new("Altar", "Drop items on an altar."))])
            .save(&config.agent.store_path)
            .unwrap();
        config
    }

    #[tokio::test]
    async fn matching_embedding_model_loads() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_wiki(dir.path(), 3);

        let wiki = load_wiki(&config, FixedEmbeddings::new(3)).await.unwrap();
        assert!(wiki.is_loaded());
        assert_eq!(wiki.document_count(), Some(1));
    }

    #[tokio::test]
    async fn mismatched_embedding_model_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_with_wiki(dir.path(), 3);

        let err = load_wiki(&config, FixedEmbeddings::new(1536)).await.unwrap_err();
        assert!(err.to_string().contains("1536-d vectors, index is 3-d"), "{err}");
    }

    #[tokio::test]
    async fn declared_dimension_fails_before_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_with_wiki(dir.path(), 3);
        config.agent.embedding_dimension = Some(384);
        let provider = FixedEmbeddings::new(3);

        let err = load_wiki(&config, provider.clone()).await.unwrap_err();
        assert!(err.to_string().contains("384-d"), "{err}");
        assert_eq!(provider.embed_calls.load(Ordering::Relaxed), 0);
    }
}
