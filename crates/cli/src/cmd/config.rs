//! Configuration management command
//!
//! Shows the effective configuration and writes the default file.

use crate::util;
use anyhow::{Context, Result};
use extension::Config;
use owo_colors::OwoColorize;
use std::path::Path;
use tracing::info;

/// List all configuration values
pub async fn run_list(config_path: Option<&Path>) -> Result<()> {
    let config = util::load_config(config_path)?;
    let path = util::config_path(config_path);

    println!("{}", "Stylus Configuration".bold());
    if path.exists() {
        println!("{}: {}\n", "Location".dimmed(), path.display().dimmed());
    } else {
        println!("{}\n", "(defaults, no config file)".dimmed());
    }

    println!("{}", "[scheduler]".yellow());
    println!(
        "  {} = {} {}",
        "tooltip_delay_ms".cyan(),
        config.scheduler.tooltip_delay_ms,
        format!("({}ms)", config.scheduler.tooltip_delay_ms).dimmed()
    );
    println!(
        "  {} = {}",
        "favicon_delay_ms".cyan(),
        config.scheduler.favicon_delay_ms
    );

    println!("\n{}", "[scheme]".yellow());
    println!("  {} = {}", "mode".cyan(), config.scheme.mode);
    println!("  {} = {}", "night_start".cyan(), config.scheme.night_start);
    println!("  {} = {}", "night_end".cyan(), config.scheme.night_end);

    println!("\n{}", "[manage]".yellow());
    println!("  {} = {}", "new_ui".cyan(), config.manage.new_ui);
    println!("  {} = {}", "favicons".cyan(), config.manage.favicons);
    println!("  {} = {}", "favicons_gray".cyan(), config.manage.favicons_gray);
    println!("  {} = {}", "targets".cyan(), config.manage.targets);

    println!("\n{}", "[storage]".yellow());
    println!(
        "  {} = [{}]",
        "packed_keys".cyan(),
        config.storage.packed_keys.join(", ")
    );

    Ok(())
}

/// Write the default config file
pub async fn run_init(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = util::config_path(config_path);
    if path.exists() && !force {
        anyhow::bail!(
            "Config file already exists: {} (use --force to overwrite)",
            path.display()
        );
    }

    let content = Config::default().to_toml_string()?;
    std::fs::write(&path, content)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(path = %path.display(), overwrite = force, "wrote default config");

    println!("{} Wrote {}", "✓".green(), path.display());
    Ok(())
}
