//! LLM Provider implementations for delver.
//!
//! All providers implement the `delver_core::Provider` trait.
//! [`router::build_from_config`] selects the endpoint from configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
