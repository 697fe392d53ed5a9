//! Text observations produced by the game environment.

use serde::{Deserialize, Serialize};

/// One environment observation, shaped like the environment's JSON
/// (`{"text": {"short_term_context": ..., "long_term_context": ...}}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    pub text: ObservationText,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservationText {
    /// Current message line, status and nearby features. Required.
    pub short_term_context: String,

    /// Map and inventory rendering. Optional.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub long_term_context: Option<String>,
}

impl Observation {
    pub fn new(short_term_context: impl Into<String>) -> Self {
        Self {
            text: ObservationText {
                short_term_context: short_term_context.into(),
                long_term_context: None,
            },
        }
    }

    pub fn with_long_term_context(mut self, long_term_context: impl Into<String>) -> Self {
        self.text.long_term_context = Some(long_term_context.into());
        self
    }

    pub fn short_term(&self) -> &str {
        &self.text.short_term_context
    }

    /// Long-term context, empty when absent.
    pub fn long_term(&self) -> &str {
        self.text.long_term_context.as_deref().unwrap_or("")
    }

    /// Both contexts joined by a space and trimmed.
    pub fn context(&self) -> String {
        format!("{} {}", self.short_term(), self.long_term())
            .trim()
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_term_context_is_optional() {
        let obs: Observation =
            serde_json::from_str(r#"{"text": {"short_term_context": "You see a jackal."}}"#).unwrap();
        assert_eq!(obs.short_term(), "You see a jackal.");
        assert_eq!(obs.long_term(), "");
        assert_eq!(obs.context(), "You see a jackal.");
    }

    #[test]
    fn context_joins_both_parts() {
        let obs = Observation::new("Hungry").with_long_term_context("map here");
        assert_eq!(obs.context(), "Hungry map here");
    }

    #[test]
    fn missing_short_term_context_is_rejected() {
        let result: Result<Observation, _> =
            serde_json::from_str(r#"{"text": {"long_term_context": "map"}}"#);
        assert!(result.is_err());
    }
}
