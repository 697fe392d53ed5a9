//! `delver step` — Run decision steps for recorded observations.
//!
//! The observation file holds one observation object or an array of them.
//! An array is played as one episode: each step receives the action chosen
//! for the previous one, unless that step ended without a usable action.
//! Every result is printed as one JSON line.

use std::path::Path;
use std::sync::Arc;

use delver_agent::{ActionOutcome, AgentAction, LlmClient, NetHackAgent};
use delver_config::AgentKind;
use delver_core::observation::Observation;
use delver_core::retrieval::Retriever;
use tracing::warn;

pub async fn run(
    explicit: Option<&Path>,
    obs_path: &Path,
    prev_action: Option<String>,
    kind: Option<AgentKind>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(explicit)?;
    if let Some(kind) = kind {
        config.agent.kind = kind;
    }

    let observations = read_observations(obs_path)?;

    let provider = delver_providers::router::build_from_config(&config.provider)?;
    let retriever: Option<Arc<dyn Retriever>> = if config.agent.kind.uses_retrieval() {
        Some(Arc::new(super::load_wiki(&config, provider.clone()).await?))
    } else {
        None
    };

    let client = LlmClient::from_settings(provider, &config.provider);
    let mut agent = NetHackAgent::from_settings(&config.agent, client, retriever)?;

    let mut previous = prev_action;
    for obs in &observations {
        let action = agent.act(obs, previous.as_deref()).await?;
        println!("{}", serde_json::to_string(&action)?);
        previous = carried_action(&action);
    }

    Ok(())
}

/// The action to report as taken before the next step. An unresolved step
/// only has the failure sentinel, which was never played.
fn carried_action(action: &AgentAction) -> Option<String> {
    if action.outcome == ActionOutcome::Unresolved {
        warn!("Step produced no action; next step starts without a previous action");
        return None;
    }
    Some(action.action().to_string())
}

fn read_observations(path: &Path) -> Result<Vec<Observation>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {e}", path.display()))?;
    parse_observations(&content).map_err(|e| format!("Invalid observation in {}: {e}", path.display()).into())
}

fn parse_observations(content: &str) -> Result<Vec<Observation>, serde_json::Error> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    if value.is_array() {
        serde_json::from_value(value)
    } else {
        serde_json::from_value(value).map(|obs| vec![obs])
    }
}
