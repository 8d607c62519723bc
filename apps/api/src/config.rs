use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Directory holding the OPM guide PDFs.
    pub reference_dir: PathBuf,
    /// Character cap for each reference excerpt sent to the LLM.
    pub reference_char_budget: usize,
    /// Optional JSON override for the builder heuristics.
    pub heuristics_path: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            anthropic_api_key: require_env("ANTHROPIC_API_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            reference_dir: std::env::var("REFERENCE_DIR")
                .unwrap_or_else(|_| "./reference".to_string())
                .into(),
            reference_char_budget: std::env::var("REFERENCE_CHAR_BUDGET")
                .unwrap_or_else(|_| "12000".to_string())
                .parse::<usize>()
                .context("REFERENCE_CHAR_BUDGET must be a non-negative integer")?,
            heuristics_path: std::env::var("HEURISTICS_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}
