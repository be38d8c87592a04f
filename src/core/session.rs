use crate::config::Config;
use crate::core::error::{ExtractError, Result};
use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }
}

/// The HTTP seam every request goes through.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse>;

    /// `Cookie` header value the jar would send to `url`.
    fn cookie_header(&self, url: &Url) -> Option<String>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
    jar: Arc<Jar>,
}

impl ReqwestTransport {
    pub fn new(config: &Config) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(browser_headers())
            .timeout(Duration::from_secs(config.timeout))
            .connect_timeout(Duration::from_secs(config.connect_timeout))
            .cookie_provider(jar.clone())
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client, jar })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse> {
        let response = self.client.get(url.clone()).headers(headers).send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }

    fn cookie_header(&self, url: &Url) -> Option<String> {
        self.jar
            .cookies(url)
            .and_then(|value| value.to_str().ok().map(str::to_string))
    }
}

// Chrome 131 on Windows, matching the user agent in the default config.
// Only headers a browser sends on every request; the fetch metadata for
// page loads and XHRs is set per request.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("accept-language", "it-IT,it;q=0.9,en-US;q=0.8,en;q=0.7"),
        (
            "sec-ch-ua",
            "\"Google Chrome\";v=\"131\", \"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
    ];
    for (name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

/// Headers of a top-level page load.
pub fn navigation_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    let pairs = [
        ("accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
        ("sec-fetch-dest", "document"),
        ("sec-fetch-mode", "navigate"),
        ("sec-fetch-site", "none"),
        ("upgrade-insecure-requests", "1"),
    ];
    for (name, value) in pairs {
        headers.insert(name, HeaderValue::from_static(value));
    }
    headers
}

/// Headers of a script-issued request; `site` is the `Sec-Fetch-Site` value.
pub fn xhr_headers(site: &'static str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert("accept", HeaderValue::from_static("*/*"));
    headers.insert("sec-fetch-dest", HeaderValue::from_static("empty"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("cors"));
    headers.insert("sec-fetch-site", HeaderValue::from_static(site));
    headers
}

/// Delay before retry number `attempt` (1-based): `base_ms * 2^(attempt-1)`,
/// capped at `max_ms`.
pub fn backoff_delay(base_ms: u64, max_ms: u64, attempt: u32) -> Duration {
    let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
    Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
}

/// State shared by every request of one extraction: the HTTP client with
/// its cookie jar, and the site's API version once resolved.
pub struct Session {
    base_url: String,
    config: Config,
    transport: Arc<dyn Transport>,
    version: Mutex<Option<String>>,
}

impl Session {
    pub fn new(base_url: &str, config: &Config) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(config)?);
        Self::with_transport(base_url, config, transport)
    }

    pub fn with_transport(
        base_url: &str,
        config: &Config,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let parsed = Url::parse(base_url)?;
        if parsed.host_str().is_none() {
            return Err(ExtractError::InvalidUrl(format!("no host in {}", base_url)));
        }

        Ok(Self {
            base_url: parsed.origin().ascii_serialization(),
            config: config.clone(),
            transport,
            version: Mutex::new(None),
        })
    }

    /// `scheme://host[:port]`, without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Absolute URL for a site path such as `/it/watch/1`.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, path))?)
    }

    pub fn cookie_header(&self, url: &Url) -> Option<String> {
        self.transport.cookie_header(url)
    }

    pub async fn fetch(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse> {
        debug!("GET {}", url);
        let response = self.transport.get(url, headers).await?;
        debug!("GET {} -> {}", url, response.status);
        Ok(response)
    }

    /// Like [`Session::fetch`], retrying transport failures, 429 and 5xx with
    /// exponential backoff. Other statuses are returned to the caller as is.
    pub async fn fetch_with_retry(&self, url: &Url, headers: HeaderMap) -> Result<HttpResponse> {
        let max_retries = self.config.retries;
        let mut attempt: u32 = 0;

        loop {
            attempt = attempt.saturating_add(1);
            let delay = backoff_delay(
                self.config.retry_delay_ms,
                self.config.max_retry_delay_ms,
                attempt,
            );

            match self.fetch(url, headers.clone()).await {
                Ok(response) if response.is_retryable() && attempt <= max_retries => {
                    warn!(
                        url = %url,
                        status = response.status,
                        attempt,
                        "Retryable HTTP status, retrying in {:?}",
                        delay
                    );
                }
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt <= max_retries => {
                    warn!(
                        url = %url,
                        error = %e,
                        attempt,
                        "Request failed, retrying in {:?}",
                        delay
                    );
                }
                Err(e) => return Err(e),
            }

            tokio::time::sleep(delay).await;
        }
    }

    /// Single page load that must succeed; the body is returned as text.
    pub async fn get_text(&self, url: &Url) -> Result<String> {
        let response = self.fetch(url, navigation_headers()).await?;
        if !response.is_success() {
            return Err(ExtractError::Http {
                status: response.status,
                url: url.to_string(),
            });
        }
        Ok(response.body)
    }

    pub(crate) fn version_slot(&self) -> &Mutex<Option<String>> {
        &self.version
    }

    pub async fn cached_version(&self) -> Option<String> {
        self.version.lock().await.clone()
    }

    pub async fn invalidate_version(&self) {
        *self.version.lock().await = None;
    }
}
