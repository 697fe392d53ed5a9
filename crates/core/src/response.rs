//! The value returned by one LLM call.

use serde::{Deserialize, Serialize};

use crate::provider::{ProviderResponse, Usage};

/// One completed LLM call.
///
/// Immutable once produced. Deriving a cleaned action from a raw completion
/// goes through [`ModelResponse::with_completion`] and
/// [`ModelResponse::with_reasoning`], which return new values, so the raw
/// chain-of-thought survives in `reasoning` next to the cleaned action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// The model output (or, after extraction, the cleaned action).
    pub completion: String,

    /// Full chain-of-thought text, set once an action has been extracted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,

    /// Token usage reported by the provider.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model answered.
    pub model: String,
}

impl ModelResponse {
    pub fn new(completion: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            reasoning: None,
            usage: None,
            model: model.into(),
        }
    }

    /// Copy of this response with `completion` replaced.
    pub fn with_completion(&self, completion: impl Into<String>) -> Self {
        Self {
            completion: completion.into(),
            ..self.clone()
        }
    }

    /// Copy of this response with `reasoning` replaced.
    pub fn with_reasoning(&self, reasoning: impl Into<String>) -> Self {
        Self {
            reasoning: Some(reasoning.into()),
            ..self.clone()
        }
    }
}

impl From<ProviderResponse> for ModelResponse {
    fn from(response: ProviderResponse) -> Self {
        Self {
            completion: response.message.content,
            reasoning: None,
            usage: response.usage,
            model: response.model,
        }
    }
}
