//! Configuration loading, validation, and management for delver.
//!
//! Loads configuration from `~/.delver/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.delver/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// LLM endpoint settings
    #[serde(default)]
    pub provider: ProviderSettings,

    /// Agent, retrieval and prompt settings
    #[serde(default)]
    pub agent: AgentSettings,
}

/// Which LLM endpoint to talk to and how.
#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// "openai", "openrouter", "ollama" or "custom"
    #[serde(default = "default_provider_kind")]
    pub kind: String,

    /// Base URL; required for "custom", optional override otherwise
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// API key (falls back to environment variables)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Chat model identifier
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per completion
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider_kind() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_max_tokens() -> u32 {
    1024
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            kind: default_provider_kind(),
            api_url: None,
            api_key: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("api_url", &self.api_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

/// The agent variant: which LLM calls a decision step issues and which
/// output format the final action must use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// One call, strict `<|ACTION|>` delimiter, no retrieval.
    Naive,
    /// One call, chain-of-thought ending in `ACTION: <action>`, no retrieval.
    ChainOfThought,
    /// `QUESTION:` query, raw retrieved documents, `ACTION:` answer.
    CotQuestionRag,
    /// `Query:` query, summarized retrieval, `ACTION:` answer.
    CotRag,
    /// `Query:` query, summarized retrieval, bare delimited action.
    RobustNaiveRag,
    /// `Query:` query, summarized retrieval, delimited action with a short explanation.
    #[default]
    RobustCotRag,
    /// Like `RobustCotRag` with a worked format example in the decision prompt.
    RobustCotImprovedRag,
}

impl AgentKind {
    pub const ALL: [AgentKind; 7] = [
        AgentKind::Naive,
        AgentKind::ChainOfThought,
        AgentKind::CotQuestionRag,
        AgentKind::CotRag,
        AgentKind::RobustNaiveRag,
        AgentKind::RobustCotRag,
        AgentKind::RobustCotImprovedRag,
    ];

    /// Whether this variant consults the wiki index.
    pub fn uses_retrieval(self) -> bool {
        !matches!(self, AgentKind::Naive | AgentKind::ChainOfThought)
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            AgentKind::Naive => "naive",
            AgentKind::ChainOfThought => "chain_of_thought",
            AgentKind::CotQuestionRag => "cot_question_rag",
            AgentKind::CotRag => "cot_rag",
            AgentKind::RobustNaiveRag => "robust_naive_rag",
            AgentKind::RobustCotRag => "robust_cot_rag",
            AgentKind::RobustCotImprovedRag => "robust_cot_improved_rag",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default)]
    pub kind: AgentKind,

    /// Embedding model used to encode retrieval queries. Must match the
    /// model the index was built with.
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Output size of `embedding_model`. When set, a wiki index of another
    /// dimension is rejected at load without an embedding call.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_dimension: Option<usize>,

    /// Flat vector index file
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Document store file (key → {title, raw_text})
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,

    /// Number of wiki documents retrieved per query
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Keep the model's chain-of-thought in the history across turns
    #[serde(default)]
    pub remember_reasoning: bool,

    /// Keep only the most recent N observations in the prompt (unbounded when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_history: Option<usize>,

    /// Word cap requested for generated retrieval queries
    #[serde(default = "default_max_query_words")]
    pub max_query_words: usize,
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_index_path() -> PathBuf {
    AppConfig::config_dir().join("index").join("nethack_wiki.index.json")
}
fn default_store_path() -> PathBuf {
    AppConfig::config_dir().join("index").join("nethack_wiki.store.json")
}
fn default_top_k() -> usize {
    3
}
fn default_max_query_words() -> usize {
    8
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            kind: AgentKind::default(),
            embedding_model: default_embedding_model(),
            embedding_dimension: None,
            index_path: default_index_path(),
            store_path: default_store_path(),
            top_k: default_top_k(),
            remember_reasoning: false,
            max_history: None,
            max_query_words: default_max_query_words(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.delver/config.toml).
    ///
    /// Also checks environment variables:
    /// - `DELVER_API_KEY`, `OPENROUTER_API_KEY`, `OPENAI_API_KEY` (first set wins,
    ///   only when no key is configured)
    /// - `DELVER_MODEL`, `DELVER_INDEX_PATH`, `DELVER_STORE_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific file path, then apply environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::read_file(path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    fn apply_env_overrides(&mut self) {
        if self.provider.api_key.is_none() {
            self.provider.api_key = std::env::var("DELVER_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if let Ok(model) = std::env::var("DELVER_MODEL") {
            self.provider.model = model;
        }

        if let Ok(path) = std::env::var("DELVER_INDEX_PATH") {
            self.agent.index_path = PathBuf::from(path);
        }

        if let Ok(path) = std::env::var("DELVER_STORE_PATH") {
            self.agent.store_path = PathBuf::from(path);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".delver")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.provider.temperature < 0.0 || self.provider.temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.provider.kind == "custom" && self.provider.api_url.is_none() {
            return Err(ConfigError::ValidationError(
                "provider.api_url is required when provider.kind = \"custom\"".into(),
            ));
        }

        if self.agent.top_k == 0 {
            return Err(ConfigError::ValidationError("agent.top_k must be > 0".into()));
        }

        if self.agent.max_query_words == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_query_words must be > 0".into(),
            ));
        }

        if self.agent.embedding_dimension == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.embedding_dimension must be > 0 when set".into(),
            ));
        }

        if self.agent.max_history == Some(0) {
            return Err(ConfigError::ValidationError(
                "agent.max_history must be > 0 when set".into(),
            ));
        }

        if self.agent.kind.uses_retrieval()
            && (self.agent.index_path.as_os_str().is_empty()
                || self.agent.store_path.as_os_str().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "agent.index_path and agent.store_path are required for retrieval agents".into(),
            ));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.provider.api_key.is_some()
    }

    /// Generate a default config TOML string (for `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
