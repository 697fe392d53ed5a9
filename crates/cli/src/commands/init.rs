//! `delver init` — Write a starter config file.

use std::path::Path;

use delver_config::AppConfig;

pub async fn run(explicit: Option<&Path>, force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = super::config_path(explicit);

    println!("delver — First-Time Setup");
    println!("=========================\n");

    if let Some(dir) = config_path.parent()
        && !dir.as_os_str().is_empty()
        && !dir.exists()
    {
        std::fs::create_dir_all(dir)?;
        println!("✅ Created config directory: {}", dir.display());
    }

    if config_path.exists() && !force {
        println!("⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or re-run with --force.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Wrote config.toml at: {}", config_path.display());

    let defaults = AppConfig::default();
    println!("\n📝 Next steps:");
    println!("   1. Set DELVER_API_KEY (or provider.api_key in {})", config_path.display());
    println!(
        "   2. Place the wiki index at {} and the store at {}",
        defaults.agent.index_path.display(),
        defaults.agent.store_path.display()
    );
    println!("   3. Run: delver check\n");

    Ok(())
}
