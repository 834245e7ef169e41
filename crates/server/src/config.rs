//! Server configuration

use anyhow::Result;
use serde::Deserialize;

/// Server configuration, read from `SLA_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// SQLite database path
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Directory holding the training artifacts
    #[serde(default = "default_artifact_dir")]
    pub artifact_dir: String,

    /// Default ticket page size
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Upper bound a caller may raise page_size to
    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,
}

fn default_api_port() -> u16 {
    8080
}

fn default_database_path() -> String {
    "data/tickets.db".to_string()
}

fn default_artifact_dir() -> String {
    "artifacts".to_string()
}

fn default_page_size() -> u32 {
    7
}

fn default_max_page_size() -> u32 {
    100
}

impl ServerConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("SLA"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_else(|_| ServerConfig {
            api_port: default_api_port(),
            database_path: default_database_path(),
            artifact_dir: default_artifact_dir(),
            page_size: default_page_size(),
            max_page_size: default_max_page_size(),
        }))
    }
}
