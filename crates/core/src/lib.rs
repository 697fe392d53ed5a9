//! # Delver Core
//!
//! Domain types, traits, and error definitions for the delver NetHack agent.
//! This crate has **no framework dependencies**: it defines the domain model
//! that the retrieval, provider and agent crates implement against.
//!
//! ## Layout
//!
//! - [`message`]: role-tagged conversation turns
//! - [`response`]: the immutable [`ModelResponse`] value returned per LLM call
//! - [`observation`]: the text observation handed over by the game environment
//! - [`provider`]: the [`Provider`] trait every LLM backend implements
//! - [`retrieval`]: the [`Embedder`] and [`Retriever`] seams used by the agent
//! - [`error`]: the error taxonomy shared by all crates

pub mod error;
pub mod message;
pub mod observation;
pub mod provider;
pub mod response;
pub mod retrieval;

// Re-export key types at crate root for ergonomics
pub use error::{Error, IndexLoadError, ProviderError, Result, RetrievalError};
pub use message::{Message, Role};
pub use observation::{Observation, ObservationText};
pub use provider::{EmbeddingRequest, EmbeddingResponse, Provider, ProviderRequest, ProviderResponse, Usage};
pub use response::ModelResponse;
pub use retrieval::{Embedder, Retriever};
