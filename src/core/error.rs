use thiserror::Error;

pub type Result<T> = std::result::Result<T, ExtractError>;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// The site's API version could not be resolved or was rejected.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("HTTP {status} for {url}")]
    Http { status: u16, url: String },

    /// A JSON or HTML payload did not have the expected structure.
    #[error("decode error: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unsupported URL format: {0}")]
    Unsupported(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

impl ExtractError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ExtractError::Transport(_))
    }
}

impl From<url::ParseError> for ExtractError {
    fn from(err: url::ParseError) -> Self {
        ExtractError::InvalidUrl(err.to_string())
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        ExtractError::Decode(err.to_string())
    }
}
