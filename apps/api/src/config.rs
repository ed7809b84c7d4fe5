use anyhow::{Context, Result};

use crate::knowledge::KnowledgeConfig;

const DEFAULT_KB_URI: &str = "filesystem://kb";

/// Application configuration loaded from environment variables.
/// Everything has a default; only malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unset means every reasoning call fails and heuristics are used.
    pub anthropic_api_key: Option<String>,
    pub port: u16,
    pub rust_log: String,
    pub mcp_enabled: bool,
    pub mcp_server_uri: String,
    pub mcp_command: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: optional_env("ANTHROPIC_API_KEY"),
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            mcp_enabled: std::env::var("MCP_ENABLED").map_or(true, |v| truthy(&v)),
            mcp_server_uri: optional_env("MCP_SERVER_URI")
                .unwrap_or_else(|| DEFAULT_KB_URI.to_string()),
            mcp_command: optional_env("MCP_COMMAND"),
        })
    }

    pub fn knowledge(&self) -> KnowledgeConfig {
        KnowledgeConfig {
            server_uri: self.mcp_server_uri.clone(),
            enabled: self.mcp_enabled,
            command: self.mcp_command.clone(),
        }
    }
}

/// Set and non-blank.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn truthy(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "off" | "no"
    )
}
