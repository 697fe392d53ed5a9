//! The per-step decision pipeline.
//!
//! # Flow
//!
//! 1. Observe: push the previous action and the new observation
//! 2. Formulate query (retrieval kinds): one call, read `Query:` / `QUESTION:`
//! 3. Retrieve: wiki search; failures degrade to no documents
//! 4. Summarize (summarizing kinds): one fresh single-message call
//! 5. Compose: transcript + context section + decision instruction
//! 6. Decide: one call
//! 7. Extract: parse the action, persist reasoning if enabled
//!
//! Any error in 2–6, or an unparseable decision, triggers exactly one
//! recovery call with a minimal fixed prompt. If that call fails the error
//! is returned.

use std::sync::Arc;
use std::time::{Duration, Instant};

use delver_config::{AgentKind, AgentSettings};
use delver_core::error::RetrievalError;
use delver_core::message::Message;
use delver_core::observation::Observation;
use delver_core::provider::Usage;
use delver_core::retrieval::Retriever;
use delver_core::ModelResponse;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::client::LlmClient;
use crate::context::{PromptBuilder, SectionKind};
use crate::error::AgentError;
use crate::parser::{self, ActionFormat, ExtractionMethod, ResponseParser};
use crate::prompts;
use crate::strategy::{ContextStyle, QueryStyle, Strategy};

/// How the returned action was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// Parsed from the decision call.
    Valid,
    /// Parsed from the recovery call.
    Recovered,
    /// Recovery produced nothing parseable; `completion` is the sentinel.
    Unresolved,
}

/// What survives a step once its transient data is released.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StepStats {
    pub llm_calls: usize,
    pub documents: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    pub usage: Usage,
    pub elapsed_ms: u64,
}

/// The result of one decision step.
#[derive(Debug, Clone, Serialize)]
pub struct AgentAction {
    /// `completion` is the cleaned action, `reasoning` the raw model output.
    pub response: ModelResponse,
    pub outcome: ActionOutcome,
    pub method: ExtractionMethod,
    pub stats: StepStats,
}

impl AgentAction {
    pub fn action(&self) -> &str {
        &self.response.completion
    }

    /// Produced by the decision call itself, not by recovery.
    pub fn is_valid(&self) -> bool {
        self.outcome == ActionOutcome::Valid
    }
}

/// Transient per-step data. Consumed by [`StepScratch::release`] at the end
/// of every step so retrieved documents and summaries never outlive it.
#[derive(Default)]
struct StepScratch {
    llm_calls: usize,
    usage: Usage,
    query: Option<String>,
    documents: Vec<String>,
    summary: Option<String>,
}

impl StepScratch {
    fn record(&mut self, response: &ModelResponse) {
        self.llm_calls += 1;
        if let Some(usage) = response.usage {
            self.usage += usage;
        }
    }

    fn release(self, elapsed: Duration) -> StepStats {
        debug!(
            documents = self.documents.len(),
            summary_len = self.summary.as_ref().map_or(0, String::len),
            "Releasing step scratch"
        );
        StepStats {
            llm_calls: self.llm_calls,
            documents: self.documents.len(),
            query: self.query,
            usage: self.usage,
            elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

/// A NetHack-playing agent for one episode.
pub struct NetHackAgent {
    kind: AgentKind,
    strategy: Strategy,
    parser: ResponseParser,
    client: LlmClient,
    prompts: PromptBuilder,
    retriever: Option<Arc<dyn Retriever>>,
    max_query_words: usize,
}

impl NetHackAgent {
    pub fn new(kind: AgentKind, client: LlmClient, prompts: PromptBuilder) -> Self {
        let strategy = Strategy::for_kind(kind);
        Self {
            kind,
            strategy,
            parser: ResponseParser::new(strategy.format),
            client,
            prompts,
            retriever: None,
            max_query_words: 8,
        }
    }

    /// Build from `[agent]` settings with the default NetHack system prompt.
    ///
    /// Retrieval kinds need a retriever; it should already be loaded.
    pub fn from_settings(
        settings: &AgentSettings,
        client: LlmClient,
        retriever: Option<Arc<dyn Retriever>>,
    ) -> Result<Self, AgentError> {
        let prompts = PromptBuilder::new()
            .with_system_prompt(prompts::nethack_system_prompt())
            .with_remember_reasoning(settings.remember_reasoning)
            .with_max_history(settings.max_history);

        let mut agent = Self::new(settings.kind, client, prompts)
            .with_max_query_words(settings.max_query_words);

        match retriever {
            Some(retriever) => agent = agent.with_retriever(retriever),
            None if agent.strategy.uses_retrieval() => {
                return Err(AgentError::MissingRetriever(settings.kind.to_string()));
            }
            None => {}
        }

        info!(
            kind = %settings.kind,
            model = %agent.client.model(),
            provider = %agent.client.provider_name(),
            "Agent ready"
        );
        Ok(agent)
    }

    pub fn with_retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    pub fn with_max_query_words(mut self, words: usize) -> Self {
        self.max_query_words = words;
        self
    }

    pub fn kind(&self) -> AgentKind {
        self.kind
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn prompt_builder(&self) -> &PromptBuilder {
        &self.prompts
    }

    pub fn client(&self) -> &LlmClient {
        &self.client
    }

    /// Run one decision step.
    pub async fn act(
        &mut self,
        obs: &Observation,
        prev_action: Option<&str>,
    ) -> Result<AgentAction, AgentError> {
        let started = Instant::now();

        if let Some(prev) = prev_action {
            self.prompts.update_action(prev);
        }
        self.prompts.update_observation(obs);

        let mut scratch = StepScratch::default();

        let decided = match self.decide(obs, &mut scratch).await {
            Ok(raw) => {
                let extraction = self.parser.extract(&raw);
                if extraction.is_failed() {
                    warn!(kind = %self.kind, "No action in model output; issuing recovery call");
                    None
                } else {
                    self.prompts.update_reasoning(&extraction.reasoning);
                    Some((extraction.to_response(&raw), extraction.method))
                }
            }
            Err(e) => {
                error!(kind = %self.kind, error = %e, "Decision step failed; issuing recovery call");
                None
            }
        };

        let (response, method, outcome) = match decided {
            Some((response, method)) => (response, method, ActionOutcome::Valid),
            None => self.recover(&mut scratch).await?,
        };

        let stats = scratch.release(started.elapsed());
        info!(
            kind = %self.kind,
            action = %response.completion,
            outcome = ?outcome,
            llm_calls = stats.llm_calls,
            episode_calls = self.client.calls(),
            documents = stats.documents,
            total_tokens = stats.usage.total_tokens,
            elapsed_ms = stats.elapsed_ms,
            "Step complete"
        );

        Ok(AgentAction {
            response,
            outcome,
            method,
            stats,
        })
    }

    /// Stages 2–6. Returns the raw decision response.
    async fn decide(
        &self,
        obs: &Observation,
        scratch: &mut StepScratch,
    ) -> Result<ModelResponse, AgentError> {
        let mut context = None;
        if let Some(style) = self.strategy.query {
            let query = self.formulate_query(style, scratch).await?;
            self.retrieve(&query, scratch).await?;
            scratch.query = Some(query);
            context = self.compose_context(obs, scratch).await?;
        }

        let mut draft = self.prompts.get_prompt();
        if let Some((kind, text)) = context {
            draft.push(kind, text);
        }
        draft.push(SectionKind::Instruction, self.strategy.decision);

        let messages = draft.render();
        debug!(
            messages = messages.len(),
            sections = draft.sections().len(),
            "Decision prompt composed"
        );

        let response = self.client.generate(&messages).await?;
        scratch.record(&response);
        Ok(response)
    }

    async fn formulate_query(
        &self,
        style: QueryStyle,
        scratch: &mut StepScratch,
    ) -> Result<String, AgentError> {
        let messages = self
            .prompts
            .get_prompt()
            .with_section(SectionKind::Instruction, style.instruction(self.max_query_words))
            .render();

        let response = self.client.generate(&messages).await?;
        scratch.record(&response);

        let query = match style.extract(&response.completion) {
            Ok(query) => query,
            Err(e) => {
                let fallback = parser::fallback_query(&response.completion, self.max_query_words);
                warn!(error = %e, fallback = %fallback, "Query marker missing; using leading words");
                fallback
            }
        };

        info!(query = %query, "RAG query");
        Ok(query)
    }

    /// Fills `scratch.documents`. Only a missing or unloaded retriever is an
    /// error; search failures leave the documents empty.
    async fn retrieve(&self, query: &str, scratch: &mut StepScratch) -> Result<(), AgentError> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| AgentError::MissingRetriever(self.kind.to_string()))?;

        if query.is_empty() {
            warn!("Empty retrieval query; continuing without wiki context");
            return Ok(());
        }

        match retriever.search(query).await {
            Ok(documents) => {
                debug!(documents = documents.len(), "Wiki documents retrieved");
                scratch.documents = documents;
            }
            Err(RetrievalError::NotLoaded) => return Err(RetrievalError::NotLoaded.into()),
            Err(e) => warn!(error = %e, "Retrieval failed; continuing without wiki context"),
        }
        Ok(())
    }

    /// Stage 4: the section carrying retrieved knowledge, if the kind uses one.
    async fn compose_context(
        &self,
        obs: &Observation,
        scratch: &mut StepScratch,
    ) -> Result<Option<(SectionKind, String)>, AgentError> {
        match self.strategy.context {
            ContextStyle::None => Ok(None),
            ContextStyle::Raw => Ok(Some((
                SectionKind::RetrievedDocuments,
                prompts::documents_block(&scratch.documents),
            ))),
            ContextStyle::Summarized { words } => {
                let request =
                    prompts::summary_request(&obs.context(), &scratch.documents.join("\n"), words);
                let response = self.client.generate(&[Message::user(request)]).await?;
                scratch.record(&response);

                let summary = response.completion.trim().to_string();
                debug!(summary_len = summary.len(), "Retrieval summarized");
                let block = prompts::summary_block(&summary);
                scratch.summary = Some(summary);
                Ok(Some((SectionKind::Summary, block)))
            }
        }
    }

    async fn recover(
        &self,
        scratch: &mut StepScratch,
    ) -> Result<(ModelResponse, ExtractionMethod, ActionOutcome), AgentError> {
        let raw = self
            .client
            .generate(&[Message::user(prompts::RECOVERY_INSTRUCTION)])
            .await?;
        scratch.record(&raw);

        let extraction = ResponseParser::new(ActionFormat::Delimiter).extract(&raw);
        let outcome = if extraction.is_failed() {
            warn!(kind = %self.kind, "Recovery call produced no action");
            ActionOutcome::Unresolved
        } else {
            ActionOutcome::Recovered
        };

        Ok((extraction.to_response(&raw), extraction.method, outcome))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::FAILED_ACTION;
    use crate::test_helpers::{ScriptedProvider, StubRetriever, text_response};
    use delver_core::error::ProviderError;

    fn observation() -> Observation {
        Observation::new("You see here a fountain.").with_long_term_context("map: @ { .")
    }

    fn agent(kind: AgentKind, provider: &Arc<ScriptedProvider>) -> NetHackAgent {
        let client = LlmClient::new(provider.clone(), "test-model");
        NetHackAgent::new(kind, client, PromptBuilder::new().with_system_prompt("rules"))
    }

    fn rag_agent(
        kind: AgentKind,
        provider: &Arc<ScriptedProvider>,
        retriever: &Arc<StubRetriever>,
    ) -> NetHackAgent {
        agent(kind, provider).with_retriever(retriever.clone())
    }

    #[tokio::test]
    async fn robust_cot_rag_issues_query_summary_decision() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Query: fountain quaffing",
            "Current State Summary: fountain nearby",
            "Quaff to try for a wish. <|ACTION|>quaff<|END|>",
        ]));
        let retriever = Arc::new(StubRetriever::with_documents(&["Fountains grant wishes.", "Water moccasins."]));
        let mut agent = rag_agent(AgentKind::RobustCotRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();

        assert_eq!(action.action(), "quaff");
        assert_eq!(action.outcome, ActionOutcome::Valid);
        assert_eq!(action.method, ExtractionMethod::Delimiter);
        assert_eq!(
            action.response.reasoning.as_deref(),
            Some("Quaff to try for a wish. <|ACTION|>quaff<|END|>")
        );
        assert_eq!(retriever.queries(), vec!["fountain quaffing"]);
        assert_eq!(provider.call_count(), 3);

        assert!(provider.last_content(0).ends_with("Query: <query>"));
        let summary_request = provider.requests()[1].messages.clone();
        assert_eq!(summary_request.len(), 1);
        assert!(summary_request[0].content.contains("Fountains grant wishes.\nWater moccasins."));
        assert!(summary_request[0].content.contains("You see here a fountain. map: @ { ."));
        let decision = provider.last_content(2);
        assert!(decision.contains("Current State Summary: fountain nearby"));
        assert!(decision.ends_with(prompts::DECIDE_DELIMITED_COT));

        assert_eq!(action.stats.llm_calls, 3);
        assert_eq!(action.stats.documents, 2);
        assert_eq!(action.stats.query.as_deref(), Some("fountain quaffing"));
        assert_eq!(action.stats.usage.total_tokens, 45);
    }

    #[tokio::test]
    async fn naive_makes_one_call() {
        let provider = Arc::new(ScriptedProvider::texts(&["<|ACTION|>east<|END|>"]));
        let mut agent = agent(AgentKind::Naive, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.action(), "east");
        assert_eq!(provider.call_count(), 1);

        let messages = provider.requests()[0].messages.clone();
        assert_eq!(messages[0], Message::system("rules"));
        assert!(messages[1].content.ends_with(prompts::DECIDE_DELIMITED_NAIVE));
    }

    #[tokio::test]
    async fn chain_of_thought_reads_keyword() {
        let provider = Arc::new(ScriptedProvider::texts(&["The fountain is risky. ACTION: west"]));
        let mut agent = agent(AgentKind::ChainOfThought, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.action(), "west");
        assert_eq!(action.method, ExtractionMethod::Keyword);
    }

    #[tokio::test]
    async fn question_rag_inlines_raw_documents() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "QUESTION: what does a fountain do?",
            "Documents say quaff. ACTION: quaff",
        ]));
        let retriever = Arc::new(StubRetriever::with_documents(&["Fountain doc."]));
        let mut agent = rag_agent(AgentKind::CotQuestionRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.action(), "quaff");
        assert_eq!(provider.call_count(), 2);
        assert_eq!(retriever.queries(), vec!["what does a fountain do"]);
        assert!(provider.last_content(1).contains("Here are the retrieved documents:\n\nFountain doc."));
    }

    #[tokio::test]
    async fn missing_query_marker_degrades_to_leading_words() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "fountain safety and wishes, plus more words past the cap",
            "summary",
            "<|ACTION|>quaff<|END|>",
        ]));
        let retriever = Arc::new(StubRetriever::with_documents(&["doc"]));
        let mut agent =
            rag_agent(AgentKind::RobustNaiveRag, &provider, &retriever).with_max_query_words(3);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Valid);
        assert_eq!(retriever.queries(), vec!["fountain safety and"]);
    }

    #[tokio::test]
    async fn unusable_query_skips_retrieval() {
        let provider = Arc::new(ScriptedProvider::texts(&["42!", "summary", "<|ACTION|>search<|END|>"]));
        let retriever = Arc::new(StubRetriever::with_documents(&["doc"]));
        let mut agent = rag_agent(AgentKind::RobustCotRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.action(), "search");
        assert!(retriever.queries().is_empty());
        assert_eq!(action.stats.documents, 0);
    }

    #[tokio::test]
    async fn retrieval_failure_degrades_to_empty_context() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Query: altar",
            "nothing retrieved",
            "<|ACTION|>look<|END|>",
        ]));
        let retriever = Arc::new(StubRetriever::failing(RetrievalError::Embedding("down".into())));
        let mut agent = rag_agent(AgentKind::RobustCotImprovedRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Valid);
        assert_eq!(provider.call_count(), 3);
        assert!(provider.last_content(1).contains("RAG Results:\n\n"));
    }

    #[tokio::test]
    async fn unloaded_retriever_goes_to_recovery() {
        let provider = Arc::new(ScriptedProvider::texts(&["Query: altar", "<|ACTION|>wait<|END|>"]));
        let retriever = Arc::new(StubRetriever::failing(RetrievalError::NotLoaded));
        let mut agent = rag_agent(AgentKind::RobustCotRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Recovered);
        assert_eq!(action.action(), "wait");
        assert_eq!(provider.last_content(1), prompts::RECOVERY_INSTRUCTION);
    }

    #[tokio::test]
    async fn upstream_error_triggers_single_recovery_call() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Ok(text_response("Query: newt")),
            Err(ProviderError::Timeout("summary".into())),
            Ok(text_response("<|ACTION|>fight<|END|>")),
        ]));
        let retriever = Arc::new(StubRetriever::with_documents(&["doc"]));
        let mut agent = rag_agent(AgentKind::RobustCotRag, &provider, &retriever);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Recovered);
        assert!(!action.is_valid());
        assert_eq!(action.action(), "fight");
        assert_eq!(provider.call_count(), 3);

        let recovery = provider.requests()[2].messages.clone();
        assert_eq!(recovery, vec![Message::user(prompts::RECOVERY_INSTRUCTION)]);
    }

    #[tokio::test]
    async fn failed_recovery_call_propagates() {
        let provider = Arc::new(ScriptedProvider::new(vec![
            Err(ProviderError::Network("offline".into())),
            Err(ProviderError::Network("still offline".into())),
        ]));
        let mut agent = agent(AgentKind::Naive, &provider);

        let err = agent.act(&observation(), None).await.unwrap_err();
        assert!(matches!(err, AgentError::Upstream(ProviderError::Network(_))));
        assert_eq!(provider.call_count(), 2);
    }

    #[tokio::test]
    async fn sentinel_is_never_returned_as_valid() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "I cannot decide.\nThere are too many options.",
            "Still thinking about it...\nNo idea.",
        ]));
        let mut agent = agent(AgentKind::Naive, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Unresolved);
        assert_eq!(action.method, ExtractionMethod::Failed);
        assert_eq!(action.action(), FAILED_ACTION);
    }

    #[tokio::test]
    async fn short_unknown_reply_triggers_recovery() {
        let provider = Arc::new(ScriptedProvider::texts(&["No clear move", "<|ACTION|>search<|END|>"]));
        let mut agent = agent(AgentKind::Naive, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.action(), "search");
        assert_eq!(action.outcome, ActionOutcome::Recovered);
        assert!(!action.is_valid());
        assert_eq!(provider.call_count(), 2);
        assert_eq!(provider.last_content(1), prompts::RECOVERY_INSTRUCTION);
    }

    #[tokio::test]
    async fn previous_action_and_reasoning_carry_over() {
        let provider = Arc::new(ScriptedProvider::texts(&[
            "Stairs are east. ACTION: east",
            "Keep going. ACTION: east",
        ]));
        let client = LlmClient::new(provider.clone(), "m");
        let prompts = PromptBuilder::new().with_remember_reasoning(true);
        let mut agent = NetHackAgent::new(AgentKind::ChainOfThought, client, prompts);

        let first = agent.act(&observation(), None).await.unwrap();
        agent.act(&observation(), Some(first.action())).await.unwrap();

        let second = provider.requests()[1].messages.clone();
        assert_eq!(
            second[1],
            Message::assistant("Previous plan:\nStairs are east. ACTION: east\n\neast")
        );
        assert!(second[2].content.starts_with("Current Observation:"));
    }

    #[tokio::test]
    async fn action_serializes_outcome_and_stats() {
        let provider = Arc::new(ScriptedProvider::texts(&["<|ACTION|>north<|END|>"]));
        let mut agent = agent(AgentKind::Naive, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["outcome"], "valid");
        assert_eq!(json["method"], "delimiter");
        assert_eq!(json["response"]["completion"], "north");
        assert_eq!(json["stats"]["llm_calls"], 1);
        assert!(json["stats"].get("query").is_none());
    }

    #[tokio::test]
    async fn retrieval_kind_without_retriever_recovers() {
        let provider = Arc::new(ScriptedProvider::texts(&["Query: x", "<|ACTION|>wait<|END|>"]));
        let mut agent = agent(AgentKind::RobustCotRag, &provider);

        let action = agent.act(&observation(), None).await.unwrap();
        assert_eq!(action.outcome, ActionOutcome::Recovered);
    }

    #[test]
    fn from_settings_requires_retriever_for_rag_kinds() {
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let settings = AgentSettings::default();
        let client = LlmClient::new(provider.clone(), "m");
        assert!(matches!(
            NetHackAgent::from_settings(&settings, client, None),
            Err(AgentError::MissingRetriever(_))
        ));

        let settings = AgentSettings {
            kind: AgentKind::Naive,
            ..AgentSettings::default()
        };
        let client = LlmClient::new(provider, "m");
        let agent = NetHackAgent::from_settings(&settings, client, None).unwrap();
        assert_eq!(agent.kind(), AgentKind::Naive);
        assert_eq!(agent.strategy().expected_calls(), 1);
    }
}
