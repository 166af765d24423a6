//! HTTP client with a bounded retry loop.
//!
//! The [`Client`] type is the main entry point for making HTTP requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    config::ClientConfig,
    json::snippet,
    request::{overlay_headers, parse_header, Request, RequestBody},
    retry::{Backoff, RetryPolicy},
    Error, Response, Result,
};
use bytes::{Bytes, BytesMut};
use http::{header::USER_AGENT, HeaderMap, HeaderValue, Method, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// An HTTP client that retries transport failures a bounded number of times.
///
/// The client is meant to be created once and reused: clones share the
/// same connection pool and configuration.
///
/// # Examples
///
/// ```no_run
/// use httputil::Client;
///
/// # async fn example() -> Result<(), httputil::Error> {
/// let client = Client::builder()
///     .max_retries(3)
///     .build()?;
///
/// let page = client.get("https://example.com/", Default::default()).await?;
/// println!("{} bytes after {} attempt(s)", page.data.len(), page.attempts);
///
/// let headers = httputil::headers([("Content-Type", "text/plain")])?;
/// let echoed = client.post("https://example.com/echo", "hello", headers).await?;
/// println!("{:?}", echoed.data);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    config: ClientConfig,
    default_headers: HeaderMap,
    retry_policy: RetryPolicy,
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("config", &self.inner.config)
            .field("default_headers", &self.inner.default_headers)
            .finish()
    }
}

/// A response whose headers have arrived but whose body is still unread.
pub(crate) struct Delivered {
    pub(crate) response: reqwest::Response,
    pub(crate) attempts: usize,
    pub(crate) started: Instant,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Builds a client straight from a [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the proxy URL or user agent is
    /// invalid, or the underlying client can't be created.
    pub fn from_config(config: ClientConfig) -> Result<Self> {
        ClientBuilder::from_config(config).build()
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// The retry policy applied to every request.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.inner.retry_policy
    }

    /// Returns a client with a different retry budget that shares this
    /// client's connection pool.
    pub fn with_max_retries(&self, max_retries: usize) -> Client {
        let config = ClientConfig {
            max_retries,
            ..self.inner.config.clone()
        };
        Client {
            inner: Arc::new(ClientInner {
                http_client: self.inner.http_client.clone(),
                retry_policy: config.retry_policy(),
                config,
                default_headers: self.inner.default_headers.clone(),
            }),
        }
    }

    /// Returns a client that routes every request through `proxy_url`.
    ///
    /// An empty URL selects [`DEFAULT_PROXY_URL`](crate::DEFAULT_PROXY_URL).
    /// The new client gets a fresh connection pool; connections warmed up by
    /// `self` are not carried over.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the proxy URL is invalid.
    pub fn with_proxy(&self, proxy_url: impl Into<String>) -> Result<Client> {
        let config = ClientConfig {
            proxy: Some(proxy_url.into()),
            ..self.inner.config.clone()
        };
        ClientBuilder {
            config,
            default_headers: self.inner.default_headers.clone(),
        }
        .build()
    }

    /// Sends a request and buffers the whole response body.
    ///
    /// Transport failures are retried according to the client's
    /// [`RetryPolicy`], re-creating the body for every attempt. Once a
    /// response arrives, its body is read completely; a body that disagrees
    /// with the declared `Content-Length` yields
    /// [`Error::ContentLengthMismatch`], whether the connection closed early
    /// or sent too much, and a 4xx/5xx status yields [`Error::HttpError`].
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use httputil::{Client, Request};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), httputil::Error> {
    /// let client = Client::builder().build()?;
    /// let request = Request::new(Method::PUT, "https://example.com/items/1")?
    ///     .with_header("Content-Type", "text/plain")?
    ///     .with_body("new value");
    ///
    /// let response = client.execute(request).await?;
    /// println!("status {}", response.status);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute(&self, request: Request) -> Result<Response<Bytes>> {
        let Delivered {
            mut response,
            attempts,
            started,
        } = self.send(&request).await?;

        let status = response.status();
        let headers = response.headers().clone();
        let expected = response.content_length();

        let mut body = BytesMut::new();
        while let Some(chunk) = next_chunk(&mut response, expected, body.len() as u64).await? {
            body.extend_from_slice(&chunk);
        }
        let body = body.freeze();
        let latency = started.elapsed();

        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            attempts = attempts,
            bytes = body.len(),
            "Received HTTP response"
        );

        check_content_length(expected, body.len() as u64)?;

        if is_error_status(status) {
            let raw_response = String::from_utf8_lossy(&body).into_owned();
            return Err(http_error(status, raw_response, headers));
        }

        Ok(Response::new(body, status, headers, latency, attempts))
    }

    /// Sends a request given by its parts and buffers the response body.
    ///
    /// # Errors
    ///
    /// See [`Client::execute`]. An unparseable URL fails before any network
    /// attempt.
    pub async fn request(
        &self,
        method: Method,
        url: impl AsRef<str>,
        body: impl Into<RequestBody>,
        headers: HeaderMap,
    ) -> Result<Response<Bytes>> {
        let request = Request::new(method, url)?
            .with_headers(headers)
            .with_body(body);
        self.execute(request).await
    }

    /// Makes a GET request.
    pub async fn get(&self, url: impl AsRef<str>, headers: HeaderMap) -> Result<Response<Bytes>> {
        self.request(Method::GET, url, RequestBody::Empty, headers).await
    }

    /// Makes a POST request with the given body.
    pub async fn post(
        &self,
        url: impl AsRef<str>,
        body: impl Into<RequestBody>,
        headers: HeaderMap,
    ) -> Result<Response<Bytes>> {
        self.request(Method::POST, url, body, headers).await
    }

    /// Delivers a request, retrying transport failures, and hands back the
    /// response with its body unread.
    pub(crate) async fn send(&self, request: &Request) -> Result<Delivered> {
        let started = Instant::now();
        let policy = &self.inner.retry_policy;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match self.send_once(request, attempt).await {
                Ok(response) => {
                    return Ok(Delivered {
                        response,
                        attempts: attempt,
                        started,
                    })
                }
                Err(e) => e,
            };

            if !error.is_retryable() {
                return Err(error);
            }

            match policy.delay_for_retry(attempt) {
                Some(delay) => {
                    tracing::warn!(
                        error = %error,
                        attempt = attempt,
                        max_attempts = policy.max_attempts(),
                        delay_ms = delay.as_millis(),
                        method = %request.method,
                        url = %request.url,
                        "Request failed, retrying"
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                None => {
                    tracing::error!(
                        error = %error,
                        attempts = attempt,
                        method = %request.method,
                        url = %request.url,
                        "Request failed, retry budget exhausted"
                    );
                    return Err(error);
                }
            }
        }
    }

    /// Executes a single delivery attempt.
    async fn send_once(&self, request: &Request, attempt: usize) -> Result<reqwest::Response> {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            attempt = attempt,
            "Executing HTTP request"
        );

        let mut headers = self.inner.default_headers.clone();
        overlay_headers(&mut headers, &request.headers);

        let mut builder = self
            .inner
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(headers);

        if let Some(body) = request.body.make() {
            builder = builder.body(body);
        }

        builder.send().await.map_err(Error::from_send)
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use httputil::{Backoff, ClientBuilder};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), httputil::Error> {
/// let client = ClientBuilder::new()
///     .max_retries(3)
///     .backoff(Backoff::Exponential {
///         initial_delay: Duration::from_millis(100),
///         max_delay: Duration::from_secs(5),
///         jitter: true,
///     })
///     .timeout(Duration::from_secs(30))
///     .proxy("http://proxy.internal:3128")
///     .default_header("Accept-Language", "en")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct ClientBuilder {
    config: ClientConfig,
    default_headers: HeaderMap,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets how many times a transport failure is retried. Total attempts
    /// are `max_retries + 1`.
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.config.max_retries = max_retries;
        self
    }

    /// Sets the delay between attempts.
    pub fn backoff(mut self, backoff: Backoff) -> Self {
        self.config.backoff = backoff;
        self
    }

    /// Sets the default `User-Agent`.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Routes all requests through a proxy. An empty URL selects
    /// [`DEFAULT_PROXY_URL`](crate::DEFAULT_PROXY_URL).
    pub fn proxy(mut self, proxy_url: impl Into<String>) -> Self {
        self.config.proxy = Some(proxy_url.into());
        self
    }

    /// Sets the total deadline of each attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = Some(timeout);
        self
    }

    /// Sets the connection deadline of each attempt.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the proxy URL or user agent is
    /// invalid, or the underlying client can't be created.
    pub fn build(self) -> Result<Client> {
        let config = self.config;

        let mut http_builder = reqwest::Client::builder();

        if let Some(proxy_url) = config.resolved_proxy() {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                Error::ConfigurationError(format!("Invalid proxy URL {:?}: {}", proxy_url, e))
            })?;
            http_builder = http_builder.proxy(proxy);
        }
        if let Some(timeout) = config.timeout {
            http_builder = http_builder.timeout(timeout);
        }
        if let Some(timeout) = config.connect_timeout {
            http_builder = http_builder.connect_timeout(timeout);
        }

        let http_client = http_builder.build().map_err(|e| {
            Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let mut default_headers = HeaderMap::new();
        let user_agent = HeaderValue::from_str(&config.user_agent).map_err(|e| {
            Error::ConfigurationError(format!("Invalid user agent: {}", e))
        })?;
        default_headers.insert(USER_AGENT, user_agent);
        overlay_headers(&mut default_headers, &self.default_headers);

        Ok(Client {
            inner: Arc::new(ClientInner {
                http_client,
                retry_policy: config.retry_policy(),
                config,
                default_headers,
            }),
        })
    }
}

pub(crate) fn is_error_status(status: StatusCode) -> bool {
    status.is_client_error() || status.is_server_error()
}

pub(crate) fn http_error(status: StatusCode, raw_response: String, headers: HeaderMap) -> Error {
    let logged = snippet(raw_response.as_bytes());

    if status.is_client_error() {
        tracing::error!(
            status = status.as_u16(),
            response = %logged,
            "Client error (4xx)"
        );
    } else {
        tracing::warn!(
            status = status.as_u16(),
            response = %logged,
            "Server error (5xx)"
        );
    }

    Error::HttpError {
        status,
        raw_response,
        headers,
    }
}

/// Reads the next body chunk. A read that fails before the declared
/// `Content-Length` was reached means the peer cut the body short.
pub(crate) async fn next_chunk(
    response: &mut reqwest::Response,
    expected: Option<u64>,
    received: u64,
) -> Result<Option<Bytes>> {
    match response.chunk().await {
        Ok(chunk) => Ok(chunk),
        Err(e) => match expected {
            Some(expected) if received < expected => {
                tracing::error!(
                    expected,
                    actual = received,
                    error = %e,
                    "Response body ended early"
                );
                Err(Error::ContentLengthMismatch {
                    expected,
                    actual: received,
                })
            }
            _ => Err(Error::Network(e)),
        },
    }
}

/// Compares the declared `Content-Length` with the bytes actually read.
pub(crate) fn check_content_length(expected: Option<u64>, actual: u64) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => {
            tracing::error!(expected, actual, "Response body length mismatch");
            Err(Error::ContentLengthMismatch { expected, actual })
        }
        _ => Ok(()),
    }
}
