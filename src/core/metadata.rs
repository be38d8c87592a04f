use serde::Serialize;
use std::time::{Duration, Instant};

pub const EXTRACTOR_NAME: &str = "streamingcommunity";
pub const EXTRACTOR_KEY: &str = "StreamingCommunity";
pub const DEFAULT_EXT: &str = "mp4";

/// One playable title or episode.
///
/// The manifest itself is never stored here: its token would expire long
/// before the download starts. `needs_manifest` and `base_url` tell the
/// download engine to call the refresher right before fetching.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_type", rename = "video")]
pub struct MediaRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    pub webpage_url: String,
    pub ext: String,
    pub extractor: String,
    pub extractor_key: String,
    pub season_number: Option<u32>,
    pub episode_number: Option<u32>,
    pub episode: String,
    pub series: Option<String>,
    #[serde(rename = "_sc_needs_m3u8_extraction")]
    pub needs_manifest: bool,
    #[serde(rename = "_sc_base_url")]
    pub base_url: String,
}

impl MediaRecord {
    pub fn new(id: String, title: String, watch_url: String, base_url: &str) -> Self {
        Self {
            id,
            title,
            url: watch_url.clone(),
            webpage_url: watch_url,
            ext: DEFAULT_EXT.to_string(),
            extractor: EXTRACTOR_NAME.to_string(),
            extractor_key: EXTRACTOR_KEY.to_string(),
            season_number: None,
            episode_number: None,
            episode: String::new(),
            series: None,
            needs_manifest: true,
            base_url: base_url.to_string(),
        }
    }
}

/// Episodes of one season, in the order the site lists them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "_type", rename = "playlist")]
pub struct PlaylistRecord {
    pub id: String,
    pub title: String,
    pub original_url: String,
    pub entries: Vec<MediaRecord>,
    pub extractor: String,
    pub extractor_key: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Extraction {
    Video(MediaRecord),
    Playlist(PlaylistRecord),
}

#[derive(Debug, Serialize)]
pub struct ManifestHeaders {
    #[serde(rename = "Referer")]
    pub referer: String,
    #[serde(rename = "Origin")]
    pub origin: String,
    #[serde(rename = "User-Agent")]
    pub user_agent: String,
}

/// Authorized manifest URL plus everything needed to fetch it.
///
/// Valid for a short window only. Request a new one for every download
/// attempt. It does not implement `Clone`.
#[derive(Debug, Serialize)]
pub struct ManifestDescriptor {
    #[serde(rename = "m3u8_url")]
    pub manifest_url: String,
    pub http_headers: ManifestHeaders,
    pub cookies: String,
    /// Unix timestamp from the `expires` query parameter, when present.
    pub expires: Option<u64>,
    #[serde(skip)]
    pub fetched_at: Instant,
}

impl ManifestDescriptor {
    pub fn is_stale(&self, max_age: Duration) -> bool {
        self.fetched_at.elapsed() > max_age
    }
}
