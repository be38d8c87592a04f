use crate::config::Config;
use crate::core::can_extract;
use crate::extractors::{resolve_fresh_manifest, StreamingCommunityExtractor};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use url::Url;

#[derive(Parser)]
#[command(name = "sc-extractor")]
#[command(about = "Extract StreamingCommunity metadata and fresh HLS manifests")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Episodes of a season extracted at once
    #[arg(short = 'j', long, global = true)]
    pub concurrent: Option<usize>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print metadata for a season or watch URL as JSON
    Info {
        #[arg(value_name = "URL")]
        url: String,
    },
    /// Print a freshly authorized manifest for a watch URL as JSON
    Manifest {
        #[arg(value_name = "WATCH_URL")]
        url: String,

        /// Site root, defaults to the watch URL's scheme and host
        #[arg(short, long)]
        base_url: Option<String>,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(concurrent) = self.concurrent {
            config.concurrent_episodes = concurrent;
        }
        Ok(config)
    }

    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.command {
            Command::Info { url } => {
                if !can_extract(url) {
                    warn!("{} does not look like a StreamingCommunity host, trying anyway", url);
                }
                let extraction = StreamingCommunityExtractor::extract_info(url, &config)
                    .await?
                    .with_context(|| format!("Nothing could be extracted from {}", url))?;
                println!("{}", serde_json::to_string_pretty(&extraction)?);
            }
            Command::Manifest { url, base_url } => {
                let base_url = match base_url {
                    Some(base_url) => base_url.clone(),
                    None => Url::parse(url)?.origin().ascii_serialization(),
                };
                let descriptor = resolve_fresh_manifest(&base_url, url, &config).await?;
                println!("{}", serde_json::to_string_pretty(&descriptor)?);
            }
        }

        Ok(())
    }
}
