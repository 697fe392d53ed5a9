//! Response parser: turns free-text completions into one clean action.
//!
//! Two output conventions are supported:
//!
//! - **Delimiter**: the first `<|ACTION|> ... <|END|>` pair, inner text trimmed.
//! - **Keyword**: everything except letters, whitespace and `:` is stripped,
//!   then the text after the last `ACTION:` is taken.
//!
//! Each agent kind has a primary convention. When it yields nothing, the other
//! one is tried, then a completion that already *is* a known action (or a
//! single keyboard character) is accepted as-is. If all of that fails the parser returns [`FAILED_ACTION`] rather
//! than an error; the orchestrator treats it as "needs recovery".

use std::sync::LazyLock;

use delver_core::ModelResponse;
use regex_lite::Regex;
use serde::Serialize;

use crate::error::AgentError;
use crate::prompts;

/// Sentinel returned when no action could be extracted.
pub const FAILED_ACTION: &str = "Failed to obtain a valid action from the reasoning.";

pub const ACTION_MARKER: &str = "ACTION:";
pub const QUERY_MARKER: &str = "Query:";
pub const QUESTION_MARKER: &str = "QUESTION:";

static DELIMITED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)<\|ACTION\|>(.*?)<\|END\|>").expect("delimiter pattern compiles")
});

/// Output convention a decision prompt asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionFormat {
    Delimiter,
    Keyword,
}

impl ActionFormat {
    fn alternate(self) -> Self {
        match self {
            ActionFormat::Delimiter => ActionFormat::Keyword,
            ActionFormat::Keyword => ActionFormat::Delimiter,
        }
    }

    fn extract(self, text: &str) -> Option<String> {
        match self {
            ActionFormat::Delimiter => extract_delimited(text),
            ActionFormat::Keyword => extract_keyword(text, ACTION_MARKER),
        }
    }

    fn method(self) -> ExtractionMethod {
        match self {
            ActionFormat::Delimiter => ExtractionMethod::Delimiter,
            ActionFormat::Keyword => ExtractionMethod::Keyword,
        }
    }
}

/// Which strategy produced the action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    Delimiter,
    Keyword,
    Bare,
    Failed,
}

/// A cleaned action plus the full text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub action: String,
    pub reasoning: String,
    pub method: ExtractionMethod,
}

impl Extraction {
    pub fn is_failed(&self) -> bool {
        self.method == ExtractionMethod::Failed
    }

    /// New response carrying the action as `completion` and the raw
    /// completion as `reasoning`. `raw` is left untouched.
    pub fn to_response(&self, raw: &ModelResponse) -> ModelResponse {
        raw.with_reasoning(self.reasoning.clone())
            .with_completion(self.action.clone())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ResponseParser {
    format: ActionFormat,
}

impl ResponseParser {
    pub fn new(format: ActionFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ActionFormat {
        self.format
    }

    pub fn extract(&self, response: &ModelResponse) -> Extraction {
        self.extract_text(&response.completion)
    }

    /// Primary format, then the alternate one, then a bare action. Never fails.
    pub fn extract_text(&self, text: &str) -> Extraction {
        let found = [self.format, self.format.alternate()]
            .into_iter()
            .find_map(|format| format.extract(text).map(|action| (action, format.method())))
            .or_else(|| extract_bare(text).map(|action| (action, ExtractionMethod::Bare)));

        let (action, method) =
            found.unwrap_or_else(|| (FAILED_ACTION.to_string(), ExtractionMethod::Failed));

        Extraction {
            action,
            reasoning: text.to_string(),
            method,
        }
    }
}

/// Inner text of the first `<|ACTION|>...<|END|>` pair, if non-empty.
pub fn extract_delimited(text: &str) -> Option<String> {
    let inner = DELIMITED.captures(text)?.get(1)?.as_str().trim();
    (!inner.is_empty()).then(|| inner.to_string())
}

/// Text after the last `marker` once non-letters are stripped, if non-empty.
pub fn extract_keyword(text: &str, marker: &str) -> Option<String> {
    let stripped = strip_to_letters(text);
    let (_, after) = stripped.rsplit_once(marker)?;
    let after = after.trim();
    (!after.is_empty()).then(|| after.to_string())
}

/// Keep ASCII letters, whitespace and `:`.
pub fn strip_to_letters(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphabetic() || c.is_whitespace() || *c == ':')
        .collect()
}

/// A completion that is already a clean action: a name from
/// [`prompts::ACTIONS`], or a single printable character (menu letters,
/// travel targets like `>`). Unknown prose is never accepted.
pub fn extract_bare(text: &str) -> Option<String> {
    let text = text.trim();
    let single_symbol = text.len() == 1 && text.chars().all(|c| c.is_ascii_graphic());

    (single_symbol || prompts::is_known_action(text)).then(|| text.to_string())
}

/// The query after the first `Query:`, up to the next one.
pub fn extract_query(text: &str) -> Result<String, AgentError> {
    let missing = || AgentError::FormatExtraction {
        marker: QUERY_MARKER,
        output: text.to_string(),
    };

    let (_, rest) = text.split_once(QUERY_MARKER).ok_or_else(missing)?;
    let query = rest.split(QUERY_MARKER).next().unwrap_or(rest);
    let query = query.trim().trim_matches('"').trim();

    if query.is_empty() {
        return Err(missing());
    }
    Ok(query.to_string())
}

/// The question after the last `QUESTION:`, letters only.
pub fn extract_question(text: &str) -> Result<String, AgentError> {
    extract_keyword(text, QUESTION_MARKER).ok_or_else(|| AgentError::FormatExtraction {
        marker: QUESTION_MARKER,
        output: text.to_string(),
    })
}

/// Best-effort query from an unmarked completion: its first `max_words`
/// words, letters only. May be empty.
pub fn fallback_query(text: &str, max_words: usize) -> String {
    strip_to_letters(text)
        .split_whitespace()
        .filter(|w| *w != ":")
        .take(max_words)
        .collect::<Vec<_>>()
        .join(" ")
}
