//! The NetHack decision loop.
//!
//! Every step follows **Observe → Query → Retrieve → Summarize → Decide →
//! Extract**, with the middle stages present only for retrieval-augmented
//! agent kinds:
//!
//! 1. **Observe**: fold the previous action and new observation into the transcript
//! 2. **Query**: ask the model for a short wiki query
//! 3. **Retrieve**: nearest-neighbor search over the wiki index
//! 4. **Summarize**: compress the hits in a separate call
//! 5. **Decide**: ask for one action in a machine-readable format
//! 6. **Extract**: parse the action, falling back to one recovery call

pub mod client;
pub mod context;
pub mod error;
pub mod orchestrator;
pub mod parser;
pub mod prompts;
pub mod strategy;

#[cfg(test)]
mod test_helpers;

pub use client::LlmClient;
pub use context::{PromptBuilder, PromptDraft, SectionKind};
pub use error::AgentError;
pub use orchestrator::{ActionOutcome, AgentAction, NetHackAgent, StepStats};
pub use parser::{ActionFormat, Extraction, ExtractionMethod, FAILED_ACTION, ResponseParser};
pub use strategy::{ContextStyle, QueryStyle, Strategy};
