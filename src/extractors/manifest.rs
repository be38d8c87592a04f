use crate::core::error::{ExtractError, Result};
use url::Url;

/// Query parameter asking the CDN for the full HD rendition.
pub const QUALITY_PARAM: &str = "h";

/// Builds the authorized manifest URL from a stream candidate.
///
/// Existing query parameters (server routing flags such as `ub`, `ab`, `b`)
/// are kept in order. `h=1`, `token` and `expires` are then set, replacing
/// any previous value, so running this on its own output changes nothing.
pub fn synthesize(
    candidate_url: &str,
    token: Option<&str>,
    expires: Option<&str>,
    quality_allowed: bool,
) -> Result<Url> {
    let mut url = Url::parse(candidate_url)
        .map_err(|e| ExtractError::Decode(format!("bad stream URL {:?}: {}", candidate_url, e)))?;

    let mut params: Vec<(String, String)> = Vec::new();
    for (key, value) in url.query_pairs() {
        if !params.iter().any(|(existing, _)| *existing == key) {
            params.push((key.into_owned(), value.into_owned()));
        }
    }

    if quality_allowed {
        set_param(&mut params, QUALITY_PARAM, "1");
    }
    if let Some(token) = token {
        set_param(&mut params, "token", token);
    }
    if let Some(expires) = expires {
        set_param(&mut params, "expires", expires);
    }

    if params.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&params);
    }

    Ok(url)
}

fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter_mut().find(|(existing, _)| existing == key) {
        Some((_, existing)) => *existing = value.to_string(),
        None => params.push((key.to_string(), value.to_string())),
    }
}
