//! delver CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Write a starter config file
//! - `check`   — Validate config and load the wiki index
//! - `search`  — Query the wiki index directly
//! - `step`    — Run decision steps for recorded observations

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use delver_config::AgentKind;

mod commands;

#[derive(Parser)]
#[command(
    name = "delver",
    about = "delver — retrieval-augmented NetHack agent",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (defaults to ~/.delver/config.toml)
    #[arg(short, long, global = true, env = "DELVER_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Init {
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },

    /// Validate configuration and load the wiki index
    Check,

    /// Search the wiki index
    Search {
        /// Free-text query
        query: String,

        /// Override the configured number of results
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Decide actions for one observation, or a JSON array of them
    Step {
        /// Observation JSON file (`{"text": {"short_term_context": ...}}`)
        #[arg(long)]
        obs: PathBuf,

        /// Action taken before the first observation
        #[arg(long)]
        prev_action: Option<String>,

        /// Override the configured agent kind
        #[arg(long, value_parser = parse_kind)]
        kind: Option<AgentKind>,
    },
}

fn parse_kind(s: &str) -> Result<AgentKind, String> {
    AgentKind::ALL
        .into_iter()
        .find(|k| k.to_string() == s)
        .ok_or_else(|| {
            let names: Vec<String> = AgentKind::ALL.iter().map(ToString::to_string).collect();
            format!("unknown agent kind '{s}' (expected one of: {})", names.join(", "))
        })
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { force } => commands::init::run(config_path, force).await?,
        Commands::Check => commands::check::run(config_path).await?,
        Commands::Search { query, top_k } => commands::search::run(config_path, &query, top_k).await?,
        Commands::Step {
            obs,
            prev_action,
            kind,
        } => commands::step::run(config_path, &obs, prev_action, kind).await?,
    }

    Ok(())
}
