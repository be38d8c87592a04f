use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Language prefix of every site path (`/it/watch/...`).
    pub locale: String,
    pub user_agent: String,
    /// Total request timeout, seconds.
    pub timeout: u64,
    pub connect_timeout: u64,
    /// Extra attempts for the landing page and API calls.
    pub retries: u32,
    pub retry_delay_ms: u64,
    /// Upper bound for a single backoff delay.
    pub max_retry_delay_ms: u64,
    /// Episodes of a season processed at once.
    pub concurrent_episodes: usize,
    pub verify_manifest: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "it".to_string(),
            user_agent: CHROME_USER_AGENT.to_string(),
            timeout: 30,
            connect_timeout: 10,
            retries: 3,
            retry_delay_ms: 500,
            max_retry_delay_ms: 10_000,
            concurrent_episodes: 1,
            verify_manifest: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Config = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }
}
