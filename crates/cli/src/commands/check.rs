//! `delver check` — Validate config, provider and wiki index.

use std::path::Path;

pub async fn run(explicit: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 delver check");
    println!("===============\n");

    let mut issues = 0;

    let config = match super::load_config(explicit) {
        Ok(config) => {
            println!("  ✅ Config valid ({})", super::config_path(explicit).display());
            config
        }
        Err(e) => {
            println!("  ❌ {e}");
            return Err("configuration is invalid".into());
        }
    };

    println!("  Agent kind: {}", config.agent.kind);
    println!("  Provider:   {} ({})", config.provider.kind, config.provider.model);

    let provider = match delver_providers::router::build_from_config(&config.provider) {
        Ok(provider) => {
            println!("  ✅ Provider configured");
            Some(provider)
        }
        Err(e) => {
            println!("  ❌ Provider: {e}");
            issues += 1;
            None
        }
    };

    if config.agent.kind.uses_retrieval() {
        match provider {
            Some(provider) => match super::load_wiki(&config, provider).await {
                Ok(wiki) => println!(
                    "  ✅ Wiki index loaded: {} documents (top_k = {})",
                    wiki.document_count().unwrap_or(0),
                    wiki.top_k()
                ),
                Err(e) => {
                    println!("  ❌ Wiki index: {e}");
                    issues += 1;
                }
            },
            None => println!("  ⚠️  Skipping wiki index check (no provider for embeddings)"),
        }
    } else {
        println!("  Wiki index not used by '{}'", config.agent.kind);
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} check(s) failed").into())
    }
}
