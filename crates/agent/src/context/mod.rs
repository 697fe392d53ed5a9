//! Prompt assembly.
//!
//! [`PromptBuilder`] owns the episode transcript and hands out
//! [`PromptDraft`]s. A draft is an ordered list of labeled sections on top
//! of a transcript copy, rendered to wire messages only at call time.

pub mod draft;
pub mod history;

pub use draft::{PromptDraft, Section, SectionKind};
pub use history::PromptBuilder;
