//! One outgoing prompt under construction.
//!
//! A draft starts from a copy of the episode transcript and collects labeled
//! sections. Nothing touches the transcript itself: sections are rendered
//! onto the final user turn only when [`PromptDraft::render`] is called.

use delver_core::message::{Message, Role};

/// What a section carries. Only used for ordering checks and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Instruction,
    RetrievedDocuments,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub kind: SectionKind,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct PromptDraft {
    base: Vec<Message>,
    sections: Vec<Section>,
}

impl PromptDraft {
    pub fn new(base: Vec<Message>) -> Self {
        Self {
            base,
            sections: Vec::new(),
        }
    }

    /// Append a section. Empty text is ignored.
    pub fn push(&mut self, kind: SectionKind, text: impl Into<String>) -> &mut Self {
        let text = text.into();
        if !text.trim().is_empty() {
            self.sections.push(Section { kind, text });
        }
        self
    }

    pub fn with_section(mut self, kind: SectionKind, text: impl Into<String>) -> Self {
        self.push(kind, text);
        self
    }

    pub fn base(&self) -> &[Message] {
        &self.base
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Wire messages: sections joined by blank lines and appended to the last
    /// user turn, or sent as a new user turn when the transcript does not end
    /// with one.
    pub fn render(&self) -> Vec<Message> {
        let mut messages = self.base.clone();
        if self.sections.is_empty() {
            return messages;
        }

        let joined = self
            .sections
            .iter()
            .map(|s| s.text.trim())
            .collect::<Vec<_>>()
            .join("\n\n");

        match messages.last_mut() {
            Some(last) if last.role == Role::User => {
                if !last.content.is_empty() {
                    last.content.push_str("\n\n");
                }
                last.content.push_str(&joined);
            }
            _ => messages.push(Message::user(joined)),
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transcript() -> Vec<Message> {
        vec![
            Message::system("You are playing NetHack."),
            Message::user("Current Observation:\nYou see a fountain."),
        ]
    }

    #[test]
    fn sections_extend_final_user_turn_in_order() {
        let draft = PromptDraft::new(transcript())
            .with_section(SectionKind::Summary, "Fountains can be quaffed.")
            .with_section(SectionKind::Instruction, "Pick an action.");

        let rendered = draft.render();
        assert_eq!(rendered.len(), 2);
        assert_eq!(rendered[0].role, Role::System);
        assert_eq!(
            rendered[1].content,
            "Current Observation:\nYou see a fountain.\n\nFountains can be quaffed.\n\nPick an action."
        );
    }

    #[test]
    fn rendering_does_not_mutate_base() {
        let draft = PromptDraft::new(transcript()).with_section(SectionKind::Instruction, "Go.");
        let _ = draft.render();
        assert_eq!(draft.base()[1].content, "Current Observation:\nYou see a fountain.");
        assert_eq!(draft.render(), draft.render());
    }

    #[test]
    fn new_user_turn_after_assistant() {
        let mut base = transcript();
        base.push(Message::assistant("north"));
        let rendered = PromptDraft::new(base)
            .with_section(SectionKind::Instruction, "Pick an action.")
            .render();
        assert_eq!(rendered.len(), 4);
        assert_eq!(rendered[3], Message::user("Pick an action."));
    }

    #[test]
    fn empty_sections_are_skipped() {
        let mut draft = PromptDraft::new(transcript());
        draft
            .push(SectionKind::RetrievedDocuments, "   ")
            .push(SectionKind::Instruction, "Pick.");
        assert_eq!(draft.sections().len(), 1);
        assert_eq!(draft.sections()[0].kind, SectionKind::Instruction);
    }

    #[test]
    fn no_sections_renders_base() {
        let draft = PromptDraft::new(transcript());
        assert_eq!(draft.render(), transcript());
    }

    #[test]
    fn empty_transcript_gets_a_user_turn() {
        let rendered = PromptDraft::default()
            .with_section(SectionKind::Instruction, "Output an action.")
            .render();
        assert_eq!(rendered, vec![Message::user("Output an action.")]);
    }
}
