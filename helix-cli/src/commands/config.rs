//! Config command - print or write helix.toml

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::config::Config;

pub fn execute(config: &Config, example: bool, output: Option<PathBuf>) -> Result<()> {
    if let Some(path) = output {
        Config::default().save_to_file(&path)?;
        log::info!("Wrote default configuration to {}", path.display());
        return Ok(());
    }

    let text = if example {
        Config::example_toml()?
    } else {
        toml::to_string_pretty(config).context("Failed to serialize configuration")?
    };
    print!("{}", text);
    Ok(())
}
