use crate::core::error::{ExtractError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static SEASON_PATH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/titles/(\d+)-([^/]+)/season-(\d+)").expect("valid regex"));
static WATCH_PATH: Lazy<Regex> = Lazy::new(|| Regex::new(r"/watch/(\d+)").expect("valid regex"));

/// The shapes of site URL the extractor knows how to handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlKind {
    Season {
        title_id: String,
        slug: String,
        season: u32,
    },
    Watch {
        title_id: String,
        episode_id: Option<String>,
    },
}

impl UrlKind {
    /// Classifies `url` without touching the network.
    pub fn parse(url: &Url) -> Result<Self> {
        let path = url.path();

        if path.contains("/season-") {
            let caps = SEASON_PATH
                .captures(path)
                .ok_or_else(|| ExtractError::InvalidUrl(format!("malformed season URL: {}", url)))?;
            let season = caps[3]
                .parse::<u32>()
                .map_err(|_| ExtractError::InvalidUrl(format!("bad season number in {}", url)))?;
            return Ok(UrlKind::Season {
                title_id: caps[1].to_string(),
                slug: caps[2].to_string(),
                season,
            });
        }

        if path.contains("/watch/") {
            let caps = WATCH_PATH
                .captures(path)
                .ok_or_else(|| ExtractError::InvalidUrl(format!("malformed watch URL: {}", url)))?;
            let episode_id = url
                .query_pairs()
                .find(|(key, _)| key == "e")
                .map(|(_, value)| value.into_owned())
                .filter(|value| !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()));
            return Ok(UrlKind::Watch {
                title_id: caps[1].to_string(),
                episode_id,
            });
        }

        Err(ExtractError::Unsupported(url.to_string()))
    }
}

/// Whether `url` points at a StreamingCommunity mirror.
pub fn can_extract(url: &str) -> bool {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(|host| host.to_ascii_lowercase()))
        .map_or(false, |host| host.contains("streamingcommunity"))
}
