use thiserror::Error;

pub type Result<T> = std::result::Result<T, DiscordError>;

#[derive(Debug, Error)]
pub enum DiscordError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_secs:.1}s")]
    RateLimited { retry_after_secs: f64 },
}

impl DiscordError {
    /// Missing permissions or an unknown channel, as opposed to a transport fault.
    pub fn is_access_denied(&self) -> bool {
        matches!(self, DiscordError::Api { status: 403 | 404, .. })
    }
}

impl From<reqwest::Error> for DiscordError {
    fn from(err: reqwest::Error) -> Self {
        DiscordError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for DiscordError {
    fn from(err: serde_json::Error) -> Self {
        DiscordError::Parse(err.to_string())
    }
}
