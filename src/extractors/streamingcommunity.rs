use crate::config::Config;
use crate::core::api::api_props;
use crate::core::error::{ExtractError, Result};
use crate::core::extractor::UrlKind;
use crate::core::metadata::{Extraction, MediaRecord, PlaylistRecord, EXTRACTOR_KEY, EXTRACTOR_NAME};
use crate::core::session::Session;
use crate::extractors::embed::follow_embed;
use crate::utils::{episode_tag, preview};
use futures::stream::{self, StreamExt};
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ItemId {
    Number(u64),
    Text(String),
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemId::Number(n) => write!(f, "{}", n),
            ItemId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TitleInfo {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SeasonRef {
    pub number: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EpisodeInfo {
    pub id: Option<ItemId>,
    pub number: Option<u32>,
    pub name: Option<String>,
    pub season: Option<SeasonRef>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TitleProps {
    title: TitleInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LoadedSeason {
    episodes: Vec<EpisodeInfo>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SeasonProps {
    loaded_season: LoadedSeason,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WatchProps {
    pub title: TitleInfo,
    pub embed_url: Option<String>,
    pub episode: Option<EpisodeInfo>,
}

/// Which episode of which title `extract_episode` works on.
struct EpisodeContext<'a> {
    title_id: &'a str,
    title_name: &'a str,
    season: u32,
    episode_id: String,
    number: u32,
    name: String,
}

impl EpisodeContext<'_> {
    fn label(&self) -> String {
        format!("{} {}", self.title_name, episode_tag(self.season, self.number))
    }
}

pub struct StreamingCommunityExtractor {
    session: Arc<Session>,
}

impl StreamingCommunityExtractor {
    pub fn new(base_url: &str, config: &Config) -> Result<Self> {
        Ok(Self::with_session(Arc::new(Session::new(base_url, config)?)))
    }

    pub fn with_session(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Extracts any supported URL with a fresh session for its host.
    pub async fn extract_info(url: &str, config: &Config) -> Result<Option<Extraction>> {
        let parsed = Url::parse(url)?;
        // Classify before building anything so bad input never hits the network.
        UrlKind::parse(&parsed)?;
        let extractor = Self::new(parsed.as_str(), config)?;
        extractor.extract(url).await
    }

    /// Season URLs become a playlist, watch URLs a single record.
    ///
    /// Only an unsupported or malformed URL, or a failure to load the
    /// season itself, is an error. A broken episode or watch page is logged
    /// and yields `Ok(None)` (or is left out of the playlist).
    pub async fn extract(&self, url: &str) -> Result<Option<Extraction>> {
        let parsed = Url::parse(url)?;
        match UrlKind::parse(&parsed)? {
            UrlKind::Season {
                title_id,
                slug,
                season,
            } => Ok(self
                .extract_season(url, &title_id, &slug, season)
                .await?
                .map(Extraction::Playlist)),
            UrlKind::Watch {
                title_id,
                episode_id,
            } => Ok(self
                .extract_watch(url, &title_id, episode_id.as_deref())
                .await
                .map(Extraction::Video)),
        }
    }

    pub async fn extract_season(
        &self,
        url: &str,
        title_id: &str,
        slug: &str,
        season: u32,
    ) -> Result<Option<PlaylistRecord>> {
        let locale = &self.session.config().locale;
        let title_path = format!("/{}/titles/{}-{}", locale, title_id, slug);

        let title: TitleProps = api_props(&self.session, &title_path).await?;
        let title_name = title.title.name.unwrap_or_else(|| "Unknown".to_string());
        info!("Extracting {} Season {}", title_name, season);

        let listing: SeasonProps =
            api_props(&self.session, &format!("{}/season-{}", title_path, season)).await?;
        let episodes = listing.loaded_season.episodes;
        info!("Found {} episodes", episodes.len());

        let mut contexts = Vec::with_capacity(episodes.len());
        for episode in episodes {
            let (Some(id), Some(number)) = (episode.id, episode.number) else {
                warn!("Skipping episode without id or number in {} Season {}", title_name, season);
                continue;
            };
            contexts.push(EpisodeContext {
                title_id,
                title_name: &title_name,
                season,
                episode_id: id.to_string(),
                number,
                name: episode.name.unwrap_or_default(),
            });
        }

        let concurrency = self.session.config().concurrent_episodes.max(1);
        let entries: Vec<MediaRecord> = stream::iter(contexts.iter())
            .map(|ctx| self.extract_episode(ctx))
            .buffered(concurrency)
            .filter_map(|record| async move { record })
            .collect()
            .await;

        if entries.is_empty() {
            warn!("No episode of {} Season {} could be extracted", title_name, season);
            return Ok(None);
        }

        Ok(Some(PlaylistRecord {
            id: format!("sc_{}_s{}", title_id, season),
            title: format!("{} Season {}", title_name, season),
            original_url: url.to_string(),
            entries,
            extractor: EXTRACTOR_NAME.to_string(),
            extractor_key: EXTRACTOR_KEY.to_string(),
        }))
    }

    async fn extract_episode(&self, ctx: &EpisodeContext<'_>) -> Option<MediaRecord> {
        info!(
            "Extracting {}: {}...",
            episode_tag(ctx.season, ctx.number),
            preview(&ctx.name, 40)
        );

        match self.try_extract_episode(ctx).await {
            Ok(record) => Some(record),
            Err(ExtractError::NotFound(what)) => {
                warn!("Skipping {}: {}", ctx.label(), what);
                None
            }
            Err(e) => {
                error!("Error extracting episode {}: {}", ctx.label(), e);
                None
            }
        }
    }

    async fn try_extract_episode(&self, ctx: &EpisodeContext<'_>) -> Result<MediaRecord> {
        let locale = &self.session.config().locale;
        let watch_path = format!("/{}/watch/{}?e={}", locale, ctx.title_id, ctx.episode_id);

        let watch: WatchProps = api_props(&self.session, &watch_path).await?;
        let embed_url = watch
            .embed_url
            .ok_or_else(|| ExtractError::NotFound("no embed URL".to_string()))?;
        // Only proves the episode is playable; the token is thrown away.
        follow_embed(&self.session, &embed_url).await?;

        let mut title = ctx.label();
        if !ctx.name.is_empty() {
            title.push_str(" - ");
            title.push_str(&ctx.name);
        }

        let watch_url = format!("{}{}", self.session.base_url(), watch_path);
        let mut record = MediaRecord::new(
            format!("sc_{}_{}", ctx.title_id, ctx.episode_id),
            title,
            watch_url,
            self.session.base_url(),
        );
        record.season_number = Some(ctx.season);
        record.episode_number = Some(ctx.number);
        record.episode = ctx.name.clone();
        record.series = Some(ctx.title_name.to_string());

        Ok(record)
    }

    pub async fn extract_watch(
        &self,
        url: &str,
        title_id: &str,
        episode_id: Option<&str>,
    ) -> Option<MediaRecord> {
        match self.try_extract_watch(url, title_id, episode_id).await {
            Ok(record) => Some(record),
            Err(e) => {
                error!("Error extracting watch URL {}: {}", url, e);
                None
            }
        }
    }

    async fn try_extract_watch(
        &self,
        url: &str,
        title_id: &str,
        episode_id: Option<&str>,
    ) -> Result<MediaRecord> {
        let mut path = format!("/{}/watch/{}", self.session.config().locale, title_id);
        if let Some(episode_id) = episode_id {
            path.push_str(&format!("?e={}", episode_id));
        }

        let watch: WatchProps = api_props(&self.session, &path).await?;
        let title_name = watch.title.name.unwrap_or_else(|| "Unknown".to_string());
        let is_tv = watch.title.kind.as_deref() == Some("tv");

        let embed_url = watch
            .embed_url
            .ok_or_else(|| ExtractError::NotFound("no embed URL".to_string()))?;
        follow_embed(&self.session, &embed_url).await?;

        let episode = watch.episode.unwrap_or_default();
        let season_number = episode.season.as_ref().and_then(|season| season.number);
        let episode_name = episode.name.unwrap_or_default();

        let (id, title) = match (is_tv, season_number, episode.number) {
            (true, Some(season), Some(number)) => {
                let suffix = episode_id
                    .map(str::to_string)
                    .unwrap_or_else(|| number.to_string());
                let mut title = format!("{} {}", title_name, episode_tag(season, number));
                if !episode_name.is_empty() {
                    title.push_str(" - ");
                    title.push_str(&episode_name);
                }
                (format!("sc_{}_{}", title_id, suffix), title)
            }
            _ => (format!("sc_{}", title_id), title_name.clone()),
        };

        let mut record = MediaRecord::new(id, title, url.to_string(), self.session.base_url());
        record.season_number = season_number;
        record.episode_number = episode.number;
        record.episode = episode_name;
        record.series = is_tv.then_some(title_name);

        Ok(record)
    }
}
