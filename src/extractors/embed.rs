//! Player page parsing.
//!
//! The player page carries everything needed to build an authorized
//! manifest URL inside one inline script (the one defining
//! `window.masterPlaylist`). The script is not JSON and changes without
//! notice, so each field is pulled out by its own small extractor and the
//! stream URL is resolved through an ordered fallback chain.

use crate::core::error::{ExtractError, Result};
use crate::core::session::Session;
use crate::extractors::manifest::synthesize;
use crate::utils::preview;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, info, warn};
use url::Url;

/// Marker identifying the player's bootstrap script.
pub const BOOTSTRAP_MARKER: &str = "masterPlaylist";

static SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script").expect("valid selector"));
static IFRAME: Lazy<Selector> = Lazy::new(|| Selector::parse("iframe").expect("valid selector"));

static TOKEN_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"'token'\s*:\s*['"]([^'"]+)['"]"#,
        r#""token"\s*:\s*"([^"]+)""#,
    ])
});
static EXPIRES_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r#"'expires'\s*:\s*['"](\d+)['"]"#,
        r#""expires"\s*:\s*"(\d+)""#,
    ])
});
static CAN_PLAY_FHD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"window\.canPlayFHD\s*=\s*(true|false)").expect("valid regex"));
static STREAM_LIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?sm)window\.streams\s*=\s*(\[.*?\])\s*(?:;|$)").expect("valid regex")
});
static URL_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"url:\s*['"]([^'"]+)['"]"#).expect("valid regex"));

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|pattern| Regex::new(pattern).expect("valid regex"))
        .collect()
}

fn first_capture(patterns: &[Regex], text: &str) -> Option<String> {
    patterns
        .iter()
        .find_map(|re| re.captures(text))
        .map(|caps| caps[1].to_string())
}

/// One delivery node offered by the player.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StreamCandidate {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub active: bool,
}

/// The active candidate, or the first one when none is marked active.
pub fn select_candidate(candidates: &[StreamCandidate]) -> Option<&StreamCandidate> {
    candidates
        .iter()
        .find(|candidate| candidate.active)
        .or_else(|| candidates.first())
}

/// Turns JavaScript-escaped `\/` separators back into `/`.
pub fn unescape_slashes(raw: &str) -> String {
    raw.replace("\\/", "/")
}

pub fn extract_token(script: &str) -> Option<String> {
    first_capture(&TOKEN_PATTERNS, script)
}

pub fn extract_expires(script: &str) -> Option<String> {
    first_capture(&EXPIRES_PATTERNS, script)
}

/// Whether the player allows the full HD rendition. Absent means no.
pub fn extract_quality_flag(script: &str) -> bool {
    CAN_PLAY_FHD
        .captures(script)
        .map_or(false, |caps| &caps[1] == "true")
}

/// Parses the `window.streams` literal. A malformed list counts as absent.
pub fn extract_candidates(script: &str) -> Vec<StreamCandidate> {
    let Some(caps) = STREAM_LIST.captures(script) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<StreamCandidate>>(&caps[1]) {
        Ok(candidates) => candidates,
        Err(e) => {
            warn!("Failed to parse window.streams: {}", e);
            Vec::new()
        }
    }
}

fn url_from_candidates(script: &str) -> Option<String> {
    let candidates = extract_candidates(script);
    select_candidate(&candidates)
        .map(|candidate| unescape_slashes(&candidate.url))
        .filter(|url| !url.is_empty())
}

fn url_from_field(script: &str) -> Option<String> {
    URL_FIELD
        .captures(script)
        .map(|caps| unescape_slashes(&caps[1]))
}

/// Stream URL sources, most specific first.
const STREAM_URL_SOURCES: &[fn(&str) -> Option<String>] = &[url_from_candidates, url_from_field];

/// Everything the bootstrap script says about the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerData {
    pub stream_url: Option<String>,
    pub token: Option<String>,
    pub expires: Option<String>,
    pub can_play_fhd: bool,
}

impl PlayerData {
    pub fn parse(script: &str) -> Self {
        Self {
            stream_url: STREAM_URL_SOURCES.iter().find_map(|source| source(script)),
            token: extract_token(script),
            expires: extract_expires(script),
            can_play_fhd: extract_quality_flag(script),
        }
    }

    /// Final manifest URL, if a stream URL was found.
    pub fn manifest_url(&self) -> Result<Option<Url>> {
        let Some(stream_url) = self.stream_url.as_deref() else {
            return Ok(None);
        };
        synthesize(
            stream_url,
            self.token.as_deref(),
            self.expires.as_deref(),
            self.can_play_fhd,
        )
        .map(Some)
    }
}

/// Inline scripts containing the bootstrap marker, in document order.
pub fn bootstrap_scripts(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(&SCRIPT)
        .map(|script| script.text().collect::<String>())
        .filter(|text| text.contains(BOOTSTRAP_MARKER))
        .collect()
}

/// `src` of the first `<iframe>` in the page.
pub fn first_iframe_src(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    document
        .select(&IFRAME)
        .next()
        .and_then(|iframe| iframe.value().attr("src"))
        .map(str::trim)
        .filter(|src| !src.is_empty())
        .map(str::to_string)
}

/// Manifest URL together with the page it must be requested from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbedManifest {
    pub manifest_url: String,
    pub referer_url: String,
}

/// Builds the manifest URL out of an already fetched player page.
pub fn manifest_from_player_page(html: &str, player_url: &str) -> Result<Option<EmbedManifest>> {
    for script in bootstrap_scripts(html) {
        debug!("Raw masterPlaylist script: {}", preview(&script, 600));

        let data = PlayerData::parse(&script);
        if let Some(stream_url) = &data.stream_url {
            info!("Stream URL: {}", stream_url);
        }

        if let Some(manifest_url) = data.manifest_url()? {
            info!("Built manifest URL: {}", manifest_url);
            return Ok(Some(EmbedManifest {
                manifest_url: manifest_url.to_string(),
                referer_url: player_url.to_string(),
            }));
        }
    }

    Ok(None)
}

/// Fetches the player page at `player_url` and extracts its manifest.
/// `Ok(None)` when the page has no usable bootstrap script.
pub async fn extract_embed_token(
    session: &Session,
    player_url: &str,
) -> Result<Option<EmbedManifest>> {
    let url = Url::parse(player_url)?;
    let html = session.get_text(&url).await?;
    manifest_from_player_page(&html, player_url)
}

/// The site's embed page wraps the real player in an iframe: follow it
/// one level, then extract from the player page.
pub async fn follow_embed(session: &Session, embed_url: &str) -> Result<EmbedManifest> {
    let url = Url::parse(embed_url)?;
    let html = session.get_text(&url).await?;

    let player_url = first_iframe_src(&html)
        .ok_or_else(|| ExtractError::NotFound(format!("no iframe in {}", embed_url)))?;
    let player_url = url.join(&player_url)?.to_string();
    debug!("Embed {} points to player {}", embed_url, player_url);

    extract_embed_token(session, &player_url)
        .await?
        .ok_or_else(|| ExtractError::NotFound(format!("no stream data in {}", player_url)))
}
