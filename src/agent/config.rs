use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;

fn default_port() -> u16 {
    8080
}

/// Agent configuration loaded from a JSON file.
///
/// The agent secret is deliberately absent here: it lives only in the
/// RELAY_SECRET environment variable and never touches disk or logs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub agent_id: String,
    /// Base URL of the internal API this agent reports lifecycle events to.
    pub api_base_url: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = fs::read_to_string(path).context("reading config file")?;
        serde_json::from_str(&raw).context("parsing config JSON")
    }
}
