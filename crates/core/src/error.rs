//! Error types for the delver domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] wraps them all.

use std::path::PathBuf;
use thiserror::Error;

/// The top-level error type for all delver operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Index loading errors ---
    #[error("Index load error: {0}")]
    IndexLoad(#[from] IndexLoadError),

    // --- Retrieval errors ---
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError {
        status_code: u16,
        message: String,
    },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failure to bring the persisted index artifacts into memory.
///
/// Fatal to agent construction: there is no degraded mode where only one of
/// the two artifacts is loaded.
#[derive(Debug, Error)]
pub enum IndexLoadError {
    #[error("Index artifact not found: {0}")]
    Missing(PathBuf),

    #[error("Failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("Malformed artifact {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Index and document store disagree: {0}")]
    Inconsistent(String),
}

/// Failure while encoding a query or searching the loaded index.
#[derive(Debug, Clone, Error)]
pub enum RetrievalError {
    #[error("Index not loaded; call load() before search()")]
    NotLoaded,

    #[error("Query embedding failed: {0}")]
    Embedding(String),

    #[error("Embedding dimension mismatch: index has {expected}, query has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Search failed: {0}")]
    Search(String),
}
