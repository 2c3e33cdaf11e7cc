use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

use crate::analysis::interpreter::SchemaPolicy;

/// Application configuration loaded from environment variables.
///
/// The OpenRouter credential is optional at startup: without it the server
/// still serves resume management, and analysis endpoints answer with a
/// configuration error.
#[derive(Debug, Clone)]
pub struct Config {
    pub openrouter_api_key: Option<String>,
    pub database_path: PathBuf,
    pub port: u16,
    pub rust_log: String,
    pub pdf_extraction_timeout: Duration,
    pub llm_timeout: Duration,
    pub max_upload_bytes: usize,
    /// Where multipart file parts are spooled while a request is handled.
    pub upload_dir: PathBuf,
    pub schema_policy: SchemaPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            openrouter_api_key: optional_env("OPENROUTER_API_KEY"),
            database_path: optional_env("DATABASE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data/ranker.db")),
            port: parse_env("PORT", 3001)?,
            rust_log: optional_env("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            pdf_extraction_timeout: Duration::from_secs(parse_env(
                "PDF_EXTRACTION_TIMEOUT_SECS",
                30,
            )?),
            llm_timeout: Duration::from_secs(parse_env("LLM_TIMEOUT_SECS", 120)?),
            max_upload_bytes: parse_env("MAX_UPLOAD_BYTES", 10 * 1024 * 1024)?,
            upload_dir: optional_env("UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(std::env::temp_dir),
            schema_policy: parse_env("SCHEMA_POLICY", SchemaPolicy::Strict)?,
        })
    }
}

/// Treats an empty value the same as an unset one.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = optional_env(key) else {
        return Ok(default);
    };
    raw.parse::<T>()
        .map_err(|e| anyhow!("invalid value '{raw}': {e}"))
        .with_context(|| format!("Failed to read environment variable '{key}'"))
}
