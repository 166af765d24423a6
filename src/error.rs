//! Error types for HTTP helper calls.
//!
//! Every failure is classified by where it happened: while building the
//! request, while delivering it, or after a response was received. Only
//! delivery failures are ever retried.

use http::{HeaderMap, StatusCode};

/// The main error type for HTTP helper calls.
///
/// # Examples
///
/// ```no_run
/// use httputil::{Client, Error};
///
/// # async fn example() -> Result<(), Error> {
/// let client = Client::builder().build()?;
///
/// match client.get("https://example.com/missing", Default::default()).await {
///     Ok(response) => println!("{} bytes", response.data.len()),
///     Err(Error::HttpError { status, .. }) => eprintln!("server said {}", status),
///     Err(e) if e.is_retryable() => eprintln!("network gave up: {}", e),
///     Err(e) => eprintln!("other error: {}", e),
/// }
/// # Ok(())
/// # }
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be delivered (connection refused, DNS failure,
    /// timeout, connection reset while reading the body, etc.).
    ///
    /// When the retry budget is exhausted the last of these is returned as is.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The URL could not be parsed. No network attempt was made.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The method, a header, or the request as a whole was malformed.
    /// No network attempt was made.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The client itself could not be configured (bad proxy URL, TLS
    /// backend failure, etc.).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The server answered with a 4xx or 5xx status code.
    ///
    /// # Fields
    ///
    /// * `status` - The HTTP status code
    /// * `raw_response` - The response body as text
    /// * `headers` - The response headers
    #[error("HTTP error {}: {}", .status.as_u16(), .status.canonical_reason().unwrap_or("Unknown Status"))]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// The number of body bytes received differs from the declared
    /// `Content-Length`. The body may have been truncated.
    #[error("Content length mismatch: expected {expected} bytes, received {actual}")]
    ContentLengthMismatch {
        /// Declared length
        expected: u64,
        /// Bytes actually read
        actual: u64,
    },

    /// Failed to serialize the request body to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// Failed to deserialize the response body.
    ///
    /// `raw_response` holds at most the first kilobyte of the body so that
    /// large HTML error pages don't end up in logs wholesale.
    #[error("Failed to deserialize response (status {status}): {serde_error}, body: {raw_response}")]
    DeserializationFailed {
        /// Prefix of the response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },

    /// Reading or writing a local sink or file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Returns `true` if this error is a transport failure that the retry
    /// loop may try again.
    ///
    /// Errors raised while *building* a request are excluded: sending the
    /// same malformed request again can't succeed. So are failures while
    /// reading a response body, which arrive after delivery.
    ///
    /// # Examples
    ///
    /// ```
    /// use httputil::Error;
    /// use http::StatusCode;
    ///
    /// let err = Error::HttpError {
    ///     status: StatusCode::SERVICE_UNAVAILABLE,
    ///     raw_response: String::new(),
    ///     headers: http::HeaderMap::new(),
    /// };
    ///
    /// // The request reached the server, so it is not retried.
    /// assert!(!err.is_retryable());
    /// ```
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Network(e) => !(e.is_builder() || e.is_body() || e.is_decode()),
            Error::InvalidUrl(_)
            | Error::InvalidRequest(_)
            | Error::ConfigurationError(_)
            | Error::HttpError { .. }
            | Error::ContentLengthMismatch { .. }
            | Error::SerializationFailed(_)
            | Error::DeserializationFailed { .. }
            | Error::Io(_) => false,
        }
    }

    /// Returns `true` if the underlying transport reported a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Network(e) if e.is_timeout())
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the (possibly truncated) response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }

    pub(crate) fn from_send(e: reqwest::Error) -> Self {
        if e.is_builder() {
            Error::InvalidRequest(e.to_string())
        } else {
            Error::Network(e)
        }
    }
}

/// A specialized `Result` type for HTTP helper calls.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_message_uses_canonical_reason() {
        let err = Error::HttpError {
            status: StatusCode::NOT_FOUND,
            raw_response: "nope".to_string(),
            headers: HeaderMap::new(),
        };
        assert_eq!(err.to_string(), "HTTP error 404: Not Found");
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.raw_response(), Some("nope"));
    }

    #[test]
    fn test_non_standard_status_message() {
        let err = Error::HttpError {
            status: StatusCode::from_u16(599).unwrap(),
            raw_response: String::new(),
            headers: HeaderMap::new(),
        };
        assert_eq!(err.to_string(), "HTTP error 599: Unknown Status");
    }

    #[test]
    fn test_only_transport_errors_are_retryable() {
        assert!(!Error::ContentLengthMismatch {
            expected: 10,
            actual: 5
        }
        .is_retryable());
        assert!(!Error::InvalidRequest("bad".into()).is_retryable());
        assert!(!Error::Io(std::io::Error::other("disk full")).is_retryable());
        assert!(!Error::SerializationFailed("x".into()).is_retryable());
    }
}
