//! Shared test doubles for agent tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use delver_core::error::{ProviderError, RetrievalError};
use delver_core::message::Message;
use delver_core::provider::{Provider, ProviderRequest, ProviderResponse, Usage};
use delver_core::retrieval::Retriever;

/// Returns scripted results in order and records every request.
///
/// Panics when called more often than scripted, so an unexpected extra LLM
/// call fails the test.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Result<ProviderResponse, ProviderError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(text_response(t))).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Last message content of call `n`.
    pub fn last_content(&self, n: usize) -> String {
        self.requests.lock().unwrap()[n]
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let call = {
            let mut requests = self.requests.lock().unwrap();
            requests.push(request);
            requests.len()
        };
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("ScriptedProvider: no response scripted for call #{call}"))
    }
}

pub fn text_response(text: &str) -> ProviderResponse {
    ProviderResponse {
        message: Message::assistant(text),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "scripted-model".into(),
    }
}

/// Fixed documents, or a fixed error; records queries.
pub struct StubRetriever {
    result: Result<Vec<String>, RetrievalError>,
    queries: Mutex<Vec<String>>,
}

impl StubRetriever {
    pub fn with_documents(docs: &[&str]) -> Self {
        Self {
            result: Ok(docs.iter().map(|d| d.to_string()).collect()),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: RetrievalError) -> Self {
        Self {
            result: Err(error),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for StubRetriever {
    async fn search(&self, query: &str) -> Result<Vec<String>, RetrievalError> {
        self.queries.lock().unwrap().push(query.to_string());
        self.result.clone()
    }
}
