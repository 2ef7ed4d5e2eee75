//! Client runtime configuration.
//!
//! Configuration is resolved once at process startup and then shared with the client as an
//! `Arc<ClientConfig>`. Nothing in this crate reads environment variables; the `*_from_env_value`
//! helpers only parse values the caller has already read.

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_USER_AGENT,
    MAX_REQUEST_TIMEOUT_SECS,
};
use std::time::Duration;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    #[error("invalid API base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("API base URL must use http or https, got {0:?}")]
    UnsupportedScheme(String),
    #[error("API base URL cannot carry query or fragment: {0}")]
    UnexpectedUrlParts(String),
    #[error("invalid request timeout: {0}")]
    InvalidTimeout(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}

pub type ClientConfigResult<T> = std::result::Result<T, ClientConfigError>;

/// Resolved HTTP client configuration.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_base_url: Url,
    request_timeout: Duration,
    user_agent: String,
}

impl ClientConfig {
    /// Create a new `ClientConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientConfigError`] if the URL does not parse, is not http(s), cannot be
    /// used as a base for endpoint paths, or the timeout is zero or above the maximum.
    pub fn new(api_base_url: &str, request_timeout: Duration) -> ClientConfigResult<Self> {
        let api_base_url = Url::parse(api_base_url.trim())?;

        if !matches!(api_base_url.scheme(), "http" | "https") {
            return Err(ClientConfigError::UnsupportedScheme(
                api_base_url.scheme().to_string(),
            ));
        }
        if api_base_url.cannot_be_a_base()
            || api_base_url.query().is_some()
            || api_base_url.fragment().is_some()
        {
            return Err(ClientConfigError::UnexpectedUrlParts(
                api_base_url.to_string(),
            ));
        }

        if request_timeout.is_zero() || request_timeout > Duration::from_secs(MAX_REQUEST_TIMEOUT_SECS)
        {
            return Err(ClientConfigError::InvalidTimeout(format!(
                "must be between 1 and {MAX_REQUEST_TIMEOUT_SECS} seconds"
            )));
        }

        Ok(Self {
            api_base_url,
            request_timeout,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Joins path segments onto the base URL, percent-encoding each segment.
    pub fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Parse the API base URL from an optional string value, falling back to the default.
pub fn api_base_url_from_env_value(value: Option<String>) -> String {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string())
}

/// Parse the request timeout (whole seconds) from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns the default timeout.
pub fn request_timeout_from_env_value(value: Option<String>) -> ClientConfigResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS)),
        Some(v) => v
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|e| ClientConfigError::InvalidTimeout(format!("{v:?}: {e}"))),
    }
}
