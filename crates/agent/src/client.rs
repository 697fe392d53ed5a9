//! The LLM call boundary used by the orchestrator.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use delver_config::ProviderSettings;
use delver_core::error::ProviderError;
use delver_core::message::{Message, estimated_tokens};
use delver_core::provider::{Provider, ProviderRequest};
use delver_core::ModelResponse;
use tracing::debug;

/// A provider bound to one model and sampling setup.
pub struct LlmClient {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    calls: AtomicUsize,
}

impl LlmClient {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.0,
            max_tokens: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn from_settings(provider: Arc<dyn Provider>, settings: &ProviderSettings) -> Self {
        Self::new(provider, &settings.model)
            .with_temperature(settings.temperature)
            .with_max_tokens(settings.max_tokens)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Calls issued so far, failed ones included.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Send `messages` and wait for the full completion.
    pub async fn generate(&self, messages: &[Message]) -> Result<ModelResponse, ProviderError> {
        let call = self.calls.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            call,
            messages = messages.len(),
            estimated_tokens = estimated_tokens(messages),
            "LLM request"
        );

        let request = ProviderRequest {
            model: self.model.clone(),
            messages: messages.to_vec(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            stop: vec![],
        };

        let response = ModelResponse::from(self.provider.complete(request).await?);
        debug!(call, completion_len = response.completion.len(), "LLM response");
        Ok(response)
    }
}
