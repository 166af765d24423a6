//! Client configuration.

use std::time::Duration;

use crate::retry::{Backoff, RetryPolicy, DEFAULT_MAX_RETRIES};

/// User-Agent sent when the caller doesn't provide one.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/93.0.4577.63 Safari/537.36 Edg/93.0.961.38";

/// Content-Type used by the JSON helpers.
pub const CONTENT_TYPE_JSON: &str = "application/json; charset=UTF-8";

/// Proxy used when an empty proxy URL is configured: a local HTTP proxy on
/// port 7890.
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:7890";

/// Settings a [`Client`](crate::Client) is built from.
///
/// # Examples
///
/// ```
/// use httputil::ClientConfig;
/// use std::time::Duration;
///
/// let config = ClientConfig {
///     max_retries: 3,
///     timeout: Some(Duration::from_secs(30)),
///     ..Default::default()
/// };
/// assert_eq!(config.retry_policy().max_attempts(), 4);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Retries allowed after the first attempt. Defaults to 1.
    pub max_retries: usize,

    /// Delay between attempts. Defaults to none.
    pub backoff: Backoff,

    /// Default `User-Agent` header.
    pub user_agent: String,

    /// Route every request through this proxy. An empty string selects
    /// [`DEFAULT_PROXY_URL`].
    pub proxy: Option<String>,

    /// Total deadline per attempt. Unbounded when `None`.
    pub timeout: Option<Duration>,

    /// Deadline for establishing a connection. Unbounded when `None`.
    pub connect_timeout: Option<Duration>,
}

impl ClientConfig {
    /// The retry policy described by this configuration.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries).with_backoff(self.backoff.clone())
    }

    /// The proxy URL that will actually be used, if any.
    pub fn resolved_proxy(&self) -> Option<&str> {
        self.proxy.as_deref().map(resolve_proxy_url)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: Backoff::None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            proxy: None,
            timeout: None,
            connect_timeout: None,
        }
    }
}

pub(crate) fn resolve_proxy_url(url: &str) -> &str {
    let url = url.trim();
    if url.is_empty() {
        DEFAULT_PROXY_URL
    } else {
        url
    }
}
