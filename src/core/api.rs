use crate::core::error::{ExtractError, Result};
use crate::core::session::{xhr_headers, Session};
use crate::core::version::resolve_version;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

pub const INERTIA_HEADER: &str = "x-inertia";
pub const INERTIA_VERSION_HEADER: &str = "x-inertia-version";

/// Status the site answers with when the version header is out of date.
const VERSION_CONFLICT: u16 = 409;

fn inertia_headers(version: &str) -> Result<HeaderMap> {
    let mut headers = xhr_headers("same-origin");
    headers.insert("x-requested-with", HeaderValue::from_static("XMLHttpRequest"));
    headers.insert(INERTIA_HEADER, HeaderValue::from_static("true"));
    let version = HeaderValue::from_str(version).map_err(|_| {
        ExtractError::Protocol(format!("version {:?} is not a valid header", version))
    })?;
    headers.insert(INERTIA_VERSION_HEADER, version);
    Ok(headers)
}

/// Versioned JSON GET of a site path such as `/it/titles/12-foo`.
pub async fn api_get(session: &Session, path: &str) -> Result<Value> {
    let url = session.url_for(path)?;
    let mut version = resolve_version(session).await?;
    let mut refreshed = false;

    loop {
        let response = session.fetch_with_retry(&url, inertia_headers(&version)?).await?;

        if response.status == VERSION_CONFLICT && !refreshed {
            warn!("Site rejected version {} for {}, resolving again", version, path);
            session.invalidate_version().await;
            version = resolve_version(session).await?;
            refreshed = true;
            continue;
        }

        if !response.is_success() {
            return Err(ExtractError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }

        debug!("API {} returned {} bytes", path, response.body.len());
        return serde_json::from_str(&response.body)
            .map_err(|e| ExtractError::Decode(format!("{} did not return JSON: {}", path, e)));
    }
}

/// [`api_get`], deserializing the page's `props` object.
pub async fn api_props<T: DeserializeOwned>(session: &Session, path: &str) -> Result<T> {
    let mut page = api_get(session, path).await?;
    let props = page
        .get_mut("props")
        .map(Value::take)
        .unwrap_or_else(|| Value::Object(serde_json::Map::new()));

    serde_json::from_value(props)
        .map_err(|e| ExtractError::Decode(format!("unexpected props for {}: {}", path, e)))
}
