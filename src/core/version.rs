use crate::core::error::{ExtractError, Result};
use crate::core::session::{navigation_headers, Session};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, info};

static APP_CONTAINER: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div#app[data-page]").expect("valid selector"));

/// Returns the API version of the site, fetching the landing page on first
/// use. Concurrent callers wait on the same lookup.
pub async fn resolve_version(session: &Session) -> Result<String> {
    let mut slot = session.version_slot().lock().await;
    if let Some(version) = slot.as_ref() {
        return Ok(version.clone());
    }

    let landing = session.url_for(&format!("/{}", session.config().locale))?;
    let response = session.fetch_with_retry(&landing, navigation_headers()).await?;
    if !response.is_success() {
        return Err(ExtractError::Protocol(format!(
            "landing page {} returned HTTP {}",
            landing, response.status
        )));
    }

    let version = parse_version(&response.body)?;
    info!("Resolved site version {}", version);
    *slot = Some(version.clone());

    Ok(version)
}

/// Reads `version` from the JSON in `<div id="app" data-page="...">`.
pub fn parse_version(html: &str) -> Result<String> {
    let document = Html::parse_document(html);
    let payload = document
        .select(&APP_CONTAINER)
        .next()
        .and_then(|element| element.value().attr("data-page"))
        .ok_or_else(|| ExtractError::Protocol("landing page has no app payload".to_string()))?;

    debug!("App payload is {} bytes", payload.len());
    let data: Value = serde_json::from_str(payload)
        .map_err(|e| ExtractError::Decode(format!("app payload is not JSON: {}", e)))?;

    match data.get("version") {
        Some(Value::String(version)) if !version.is_empty() => Ok(version.clone()),
        Some(Value::Number(version)) => Ok(version.to_string()),
        _ => Err(ExtractError::Protocol("app payload has no version".to_string())),
    }
}
