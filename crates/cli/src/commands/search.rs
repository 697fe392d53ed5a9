//! `delver search` — Query the wiki index directly.

use std::path::Path;

pub async fn run(
    explicit: Option<&Path>,
    query: &str,
    top_k: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(explicit)?;
    let provider = delver_providers::router::build_from_config(&config.provider)?;
    let wiki = super::load_wiki(&config, provider).await?;

    let k = top_k.unwrap_or(wiki.top_k());
    let hits = wiki.search_top(query, k).await?;

    if hits.is_empty() {
        println!("No documents found.");
        return Ok(());
    }

    for (rank, hit) in hits.iter().enumerate() {
        println!("{}. {} [{}] score={:.4}", rank + 1, hit.title, hit.key, hit.score);
        let preview: String = hit.raw_text.chars().take(200).collect();
        println!("   {}", preview.replace('\n', " "));
        println!();
    }

    Ok(())
}
