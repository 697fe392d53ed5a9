//! Per-kind pipeline shape: which stages run and which prompts they use.

use delver_config::AgentKind;

use crate::error::AgentError;
use crate::parser::{self, ActionFormat};
use crate::prompts;

/// How the retrieval query is requested and read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStyle {
    /// `Query: <query>`, a short search phrase.
    Query,
    /// `QUESTION: <question>`, a short natural-language question.
    Question,
}

impl QueryStyle {
    pub fn instruction(self, max_words: usize) -> String {
        match self {
            QueryStyle::Query => prompts::query_instruction(max_words),
            QueryStyle::Question => prompts::question_instruction(max_words),
        }
    }

    pub fn extract(self, completion: &str) -> Result<String, AgentError> {
        match self {
            QueryStyle::Query => parser::extract_query(completion),
            QueryStyle::Question => parser::extract_question(completion),
        }
    }
}

/// How retrieved documents reach the decision prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextStyle {
    None,
    /// Documents inlined verbatim.
    Raw,
    /// Documents compressed by a separate summarization call.
    Summarized { words: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strategy {
    pub query: Option<QueryStyle>,
    pub context: ContextStyle,
    pub format: ActionFormat,
    pub decision: &'static str,
}

impl Strategy {
    pub fn for_kind(kind: AgentKind) -> Self {
        match kind {
            AgentKind::Naive => Self {
                query: None,
                context: ContextStyle::None,
                format: ActionFormat::Delimiter,
                decision: prompts::DECIDE_DELIMITED_NAIVE,
            },
            AgentKind::ChainOfThought => Self {
                query: None,
                context: ContextStyle::None,
                format: ActionFormat::Keyword,
                decision: prompts::DECIDE_KEYWORD_COT,
            },
            AgentKind::CotQuestionRag => Self {
                query: Some(QueryStyle::Question),
                context: ContextStyle::Raw,
                format: ActionFormat::Keyword,
                decision: prompts::DECIDE_KEYWORD_DOCUMENTS,
            },
            AgentKind::CotRag => Self {
                query: Some(QueryStyle::Query),
                context: ContextStyle::Summarized { words: 50 },
                format: ActionFormat::Keyword,
                decision: prompts::DECIDE_KEYWORD_SUMMARY,
            },
            AgentKind::RobustNaiveRag => Self {
                query: Some(QueryStyle::Query),
                context: ContextStyle::Summarized { words: 30 },
                format: ActionFormat::Delimiter,
                decision: prompts::DECIDE_DELIMITED_NAIVE,
            },
            AgentKind::RobustCotRag => Self {
                query: Some(QueryStyle::Query),
                context: ContextStyle::Summarized { words: 30 },
                format: ActionFormat::Delimiter,
                decision: prompts::DECIDE_DELIMITED_COT,
            },
            AgentKind::RobustCotImprovedRag => Self {
                query: Some(QueryStyle::Query),
                context: ContextStyle::Summarized { words: 50 },
                format: ActionFormat::Delimiter,
                decision: prompts::DECIDE_DELIMITED_COT_IMPROVED,
            },
        }
    }

    pub fn uses_retrieval(&self) -> bool {
        self.query.is_some()
    }

    /// LLM calls on the happy path (no recovery).
    pub fn expected_calls(&self) -> usize {
        let query = usize::from(self.query.is_some());
        let summary = usize::from(matches!(self.context, ContextStyle::Summarized { .. }));
        query + summary + 1
    }
}
