//! Query embedders.

use std::sync::Arc;

use async_trait::async_trait;
use delver_core::error::RetrievalError;
use delver_core::provider::{EmbeddingRequest, Provider};
use delver_core::retrieval::Embedder;
use tracing::debug;

/// Encodes queries through a provider's embeddings endpoint.
///
/// The model must be the one the index was built with, otherwise the
/// dimension check at load time (when `dimension` is set) or at search
/// time will reject it.
pub struct ProviderEmbedder {
    provider: Arc<dyn Provider>,
    model: String,
    dimension: Option<usize>,
}

impl ProviderEmbedder {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            dimension: None,
        }
    }

    /// Declare the output dimension so a mismatched index fails at load.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }
}

#[async_trait]
impl Embedder for ProviderEmbedder {
    async fn encode(&self, text: &str) -> Result<Vec<f32>, RetrievalError> {
        let request = EmbeddingRequest {
            model: self.model.clone(),
            inputs: vec![text.to_string()],
        };

        let response = self
            .provider
            .embed(request)
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("provider returned no embedding".into()))?;

        debug!(model = %self.model, dimension = embedding.len(), "Query encoded");
        Ok(embedding)
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }
}
