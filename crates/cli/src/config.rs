//! CLI configuration file
//!
//! `~/.config/slactl/config.json` supplies the API URL when neither the
//! `--api-url` flag nor `SLA_API_URL` is set.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// API endpoint URL
    pub api_url: Option<String>,
}

impl Config {
    /// Read the config file; absent file means defaults
    pub fn load() -> Result<Self> {
        let path = config_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

fn config_path() -> Result<PathBuf> {
    let home = dirs_next::home_dir().context("could not determine home directory")?;
    Ok(home.join(".config").join("slactl").join("config.json"))
}
