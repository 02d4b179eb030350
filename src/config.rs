use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};

const DEFAULT_BIND: &str = "0.0.0.0:3000";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub bind_addr: SocketAddr,
    /// Pin a single model instead of walking the fallback list.
    pub model_override: Option<String>,
    /// Upper bound on one remote analysis call.
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| anyhow!("GEMINI_API_KEY must be set (put it in .env)"))?;
        if api_key.trim().is_empty() {
            return Err(anyhow!("GEMINI_API_KEY is set but empty"));
        }

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| DEFAULT_BIND.to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        let model_override = std::env::var("GEMINI_MODEL")
            .ok()
            .filter(|m| !m.trim().is_empty());

        let timeout_secs = match std::env::var("REQUEST_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .context("REQUEST_TIMEOUT_SECS must be a positive integer")?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        Ok(Config {
            api_key,
            bind_addr,
            model_override,
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }
}
