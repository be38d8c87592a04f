//! Just-in-time manifest resolution.
//!
//! Player tokens expire within minutes, so the download engine calls in
//! here right before it starts fetching a record saved by the extractor.

use crate::config::Config;
use crate::core::api::api_props;
use crate::core::error::{ExtractError, Result};
use crate::core::metadata::{ManifestDescriptor, ManifestHeaders};
use crate::core::session::{xhr_headers, Session};
use crate::extractors::embed::follow_embed;
use crate::extractors::streamingcommunity::WatchProps;
use crate::utils::{merge_cookie_headers, origin_of, preview};
use reqwest::header::{HeaderValue, ORIGIN, REFERER};
use std::time::Instant;
use tracing::{error, info, warn};
use url::Url;

/// Resolves a not-yet-expired manifest for `watch_url` on a brand new
/// session. Use the result immediately and do not keep it around.
pub async fn resolve_fresh_manifest(
    base_url: &str,
    watch_url: &str,
    config: &Config,
) -> Result<ManifestDescriptor> {
    let session = Session::new(base_url, config)?;
    resolve_fresh_manifest_with(&session, watch_url).await
}

/// Same as [`resolve_fresh_manifest`] on a caller-provided session.
pub async fn resolve_fresh_manifest_with(
    session: &Session,
    watch_url: &str,
) -> Result<ManifestDescriptor> {
    let watch = Url::parse(watch_url)?;
    let mut path = watch.path().to_string();
    if let Some(query) = watch.query() {
        path.push('?');
        path.push_str(query);
    }

    let props: WatchProps = api_props(session, &path).await?;
    let embed_url = props
        .embed_url
        .ok_or_else(|| ExtractError::NotFound(format!("no embed URL for {}", watch_url)))?;

    let embed = follow_embed(session, &embed_url).await?;
    let player = Url::parse(&embed.referer_url)?;
    let manifest = Url::parse(&embed.manifest_url)?;
    let origin = origin_of(&player);

    let base = session.url_for("/")?;
    let cookies = [&base, &player, &manifest]
        .iter()
        .filter_map(|url| session.cookie_header(url))
        .collect::<Vec<_>>();
    let cookies = merge_cookie_headers(cookies.iter().map(String::as_str));

    if session.config().verify_manifest {
        verify_manifest(session, &manifest, &embed.referer_url, &origin).await;
    }

    let expires = manifest
        .query_pairs()
        .find(|(key, _)| key == "expires")
        .and_then(|(_, value)| value.parse::<u64>().ok());

    Ok(ManifestDescriptor {
        manifest_url: embed.manifest_url,
        http_headers: ManifestHeaders {
            referer: embed.referer_url,
            origin,
            user_agent: session.config().user_agent.clone(),
        },
        cookies,
        expires,
        fetched_at: Instant::now(),
    })
}

/// Best-effort GET of the manifest the way the player would request it.
/// Only logs; a failure here never fails the resolution.
async fn verify_manifest(session: &Session, manifest: &Url, referer: &str, origin: &str) {
    info!("Testing manifest access with the same session...");

    let mut headers = xhr_headers("cross-site");
    for (name, value) in [(REFERER, referer), (ORIGIN, origin)] {
        match HeaderValue::from_str(value) {
            Ok(value) => {
                headers.insert(name, value);
            }
            Err(_) => warn!("Skipping invalid {} header {:?}", name, value),
        }
    }

    match session.fetch(manifest, headers).await {
        Ok(response) if response.is_success() => {
            info!(
                "Manifest check: status={}, length={}",
                response.status,
                response.body.len()
            );
            info!("Manifest preview: {}...", preview(&response.body, 300));
        }
        Ok(response) => {
            error!("Manifest check failed with status {}", response.status);
            error!("Response body preview: {}", preview(&response.body, 500));
        }
        Err(e) => error!("Manifest check request failed: {}", e),
    }
}
