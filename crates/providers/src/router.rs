//! Provider selection from configuration.

use std::sync::Arc;

use delver_config::ProviderSettings;
use delver_core::error::ProviderError;
use delver_core::provider::Provider;
use tracing::info;

use crate::openai_compat::OpenAiCompatProvider;

/// Build the configured LLM provider.
///
/// Hosted endpoints need an API key; local ones (`ollama`, `vllm`,
/// `llamacpp`, `custom`) accept an empty one.
pub fn build_from_config(
    settings: &ProviderSettings,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let kind = settings.kind.as_str();
    let base_url = match (&settings.api_url, kind) {
        (Some(url), _) => url.clone(),
        (None, "custom") => {
            return Err(ProviderError::NotConfigured(
                "custom provider requires api_url".into(),
            ));
        }
        (None, other) => default_base_url(other).ok_or_else(|| {
            ProviderError::NotConfigured(format!("unknown provider kind '{other}'"))
        })?,
    };

    let api_key = match (&settings.api_key, requires_api_key(kind)) {
        (Some(key), _) => key.clone(),
        (None, false) => String::new(),
        (None, true) => {
            return Err(ProviderError::NotConfigured(format!(
                "no API key configured for '{kind}'; set DELVER_API_KEY or provider.api_key"
            )));
        }
    };

    info!(provider = kind, base_url = %base_url, model = %settings.model, "Provider configured");
    Ok(Arc::new(OpenAiCompatProvider::new(kind, base_url, api_key)))
}

fn requires_api_key(kind: &str) -> bool {
    matches!(kind, "openai" | "openrouter" | "groq" | "together" | "deepseek")
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Option<String> {
    let url = match provider_name {
        "openrouter" => "https://openrouter.ai/api/v1",
        "openai" => "https://api.openai.com/v1",
        "ollama" => "http://localhost:11434/v1",
        "deepseek" => "https://api.deepseek.com/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        _ => return None,
    };
    Some(url.to_string())
}
