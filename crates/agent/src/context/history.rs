//! Episode transcript: the prompt assembler the orchestrator feeds each step.

use std::collections::VecDeque;

use delver_core::message::Message;
use delver_core::observation::Observation;

use super::draft::PromptDraft;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Observation(String),
    Action {
        action: String,
        reasoning: Option<String>,
    },
}

/// Running history for one episode.
///
/// Observations render as user turns and actions as assistant turns. The
/// short-term part of the latest observation (message line, status) is only
/// shown for the current turn; older turns keep their long-term rendering.
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    system_prompt: Option<String>,
    events: VecDeque<Event>,
    short_term: String,
    pending_reasoning: Option<String>,
    remember_reasoning: bool,
    max_history: Option<usize>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Keep chain-of-thought from the previous decision in the transcript.
    pub fn with_remember_reasoning(mut self, enabled: bool) -> Self {
        self.remember_reasoning = enabled;
        self
    }

    /// Keep at most `max` observations; older turns are dropped.
    pub fn with_max_history(mut self, max: Option<usize>) -> Self {
        self.max_history = max;
        self
    }

    /// Record a new observation. A second observation with no action in
    /// between extends the pending one and drops any stashed reasoning,
    /// which belonged to a decision that was never acted on.
    pub fn update_observation(&mut self, obs: &Observation) {
        let text = obs.long_term().trim().to_string();
        self.short_term = obs.short_term().trim().to_string();

        match self.events.back_mut() {
            Some(Event::Observation(pending)) => {
                self.pending_reasoning = None;
                if !text.is_empty() {
                    if !pending.is_empty() {
                        pending.push_str("\n\n");
                    }
                    pending.push_str(&text);
                }
            }
            _ => self.events.push_back(Event::Observation(text)),
        }

        self.enforce_window();
    }

    /// Record the action taken since the last observation.
    pub fn update_action(&mut self, action: &str) {
        let reasoning = self.pending_reasoning.take();
        self.events.push_back(Event::Action {
            action: action.trim().to_string(),
            reasoning,
        });
    }

    /// Stash the reasoning behind the next action. Ignored unless
    /// reasoning is remembered.
    pub fn update_reasoning(&mut self, reasoning: &str) {
        if self.remember_reasoning {
            self.pending_reasoning = Some(reasoning.trim().to_string());
        }
    }

    pub fn observation_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, Event::Observation(_)))
            .count()
    }

    /// A draft over a copy of the current transcript.
    pub fn get_prompt(&self) -> PromptDraft {
        let mut messages = Vec::with_capacity(self.events.len() + 1);
        if let Some(system) = &self.system_prompt {
            messages.push(Message::system(system.clone()));
        }

        let last_observation = self
            .events
            .iter()
            .rposition(|e| matches!(e, Event::Observation(_)));

        for (i, event) in self.events.iter().enumerate() {
            match event {
                Event::Observation(text) if Some(i) == last_observation => {
                    messages.push(Message::user(self.render_current(text)));
                }
                Event::Observation(text) => {
                    messages.push(Message::user(format!("Observation:\n{text}")));
                }
                Event::Action { action, reasoning } => {
                    let content = match reasoning {
                        Some(plan) if self.remember_reasoning => {
                            format!("Previous plan:\n{plan}\n\n{action}")
                        }
                        _ => action.clone(),
                    };
                    messages.push(Message::assistant(content));
                }
            }
        }

        PromptDraft::new(messages)
    }

    fn render_current(&self, long_term: &str) -> String {
        let mut text = String::from("Current Observation:\n");
        text.push_str(long_term);
        if !self.short_term.is_empty() {
            if !long_term.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str(&self.short_term);
        }
        text
    }

    /// Drop whole turns from the front until at most `max_history`
    /// observations remain.
    fn enforce_window(&mut self) {
        let Some(max) = self.max_history else {
            return;
        };
        while self.observation_count() > max {
            self.events.pop_front();
            while matches!(self.events.front(), Some(Event::Action { .. })) {
                self.events.pop_front();
            }
        }
    }
}
