//! Errors raised while producing an action.

use delver_core::error::{ProviderError, RetrievalError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    /// An LLM call failed. Fatal only when the recovery call fails too.
    #[error("LLM call failed: {0}")]
    Upstream(#[from] ProviderError),

    /// Retrieval failed in a way that cannot be degraded to an empty context.
    #[error("Retrieval failed: {0}")]
    Retrieval(#[from] RetrievalError),

    /// The model answered without the marker the prompt asked for.
    #[error("Expected '{marker}' in model output")]
    FormatExtraction { marker: &'static str, output: String },

    /// A retrieval-augmented agent kind was built without a retriever.
    #[error("Agent kind '{0}' needs a retriever")]
    MissingRetriever(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_wraps_provider_error() {
        let err: AgentError = ProviderError::Timeout("30s".into()).into();
        assert!(matches!(err, AgentError::Upstream(_)));
        assert!(err.to_string().contains("30s"));
    }

    #[test]
    fn format_error_names_marker() {
        let err = AgentError::FormatExtraction {
            marker: "Query:",
            output: "I think we should look around".into(),
        };
        assert!(err.to_string().contains("Query:"));
    }
}
