//! Request descriptors and re-creatable request bodies.

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use std::fmt;
use std::sync::Arc;
use url::Url;

use crate::{Error, Result};

/// Body of an outgoing request.
///
/// A failed attempt may have consumed the body it was sent with, so every
/// variant can produce a fresh [`reqwest::Body`] for each attempt.
#[derive(Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,

    /// Buffered bytes. Cloning is a reference-count bump.
    Bytes(Bytes),

    /// Produces a new body for every attempt, e.g. by reopening a file or
    /// restarting a stream.
    Factory(Arc<dyn Fn() -> reqwest::Body + Send + Sync>),
}

impl RequestBody {
    /// Wraps a closure that yields a fresh body per attempt.
    pub fn from_fn<F>(factory: F) -> Self
    where
        F: Fn() -> reqwest::Body + Send + Sync + 'static,
    {
        RequestBody::Factory(Arc::new(factory))
    }

    /// Returns `true` for [`RequestBody::Empty`].
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestBody::Empty)
    }

    pub(crate) fn make(&self) -> Option<reqwest::Body> {
        match self {
            RequestBody::Empty => None,
            RequestBody::Bytes(bytes) => Some(reqwest::Body::from(bytes.clone())),
            RequestBody::Factory(factory) => Some(factory()),
        }
    }
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Empty => f.write_str("Empty"),
            RequestBody::Bytes(bytes) => write!(f, "Bytes({} bytes)", bytes.len()),
            RequestBody::Factory(_) => f.write_str("Factory"),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(Bytes::from(bytes))
    }
}

impl From<&'static [u8]> for RequestBody {
    fn from(bytes: &'static [u8]) -> Self {
        RequestBody::Bytes(Bytes::from_static(bytes))
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Bytes(Bytes::from(text))
    }
}

impl From<&'static str> for RequestBody {
    fn from(text: &'static str) -> Self {
        RequestBody::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

/// Everything needed to issue one logical request.
///
/// The URL is parsed up front, so a `Request` that exists is one the
/// client can at least attempt to send.
#[derive(Debug, Clone)]
pub struct Request {
    /// The HTTP method (GET, POST, etc.).
    pub method: Method,

    /// The absolute target URL.
    pub url: Url,

    /// Headers that override the client's defaults.
    pub headers: HeaderMap,

    /// The request body.
    pub body: RequestBody,
}

impl Request {
    /// Creates a request with no headers and no body.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if `url` doesn't parse.
    pub fn new(method: Method, url: impl AsRef<str>) -> Result<Self> {
        Ok(Self {
            method,
            url: Url::parse(url.as_ref())?,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        })
    }

    /// Creates a request from a textual method such as `"PUT"`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRequest`] for a method that isn't a valid
    /// HTTP token and [`Error::InvalidUrl`] for an unparseable URL.
    pub fn parse(method: impl AsRef<str>, url: impl AsRef<str>) -> Result<Self> {
        let method = Method::from_bytes(method.as_ref().as_bytes()).map_err(|e| {
            Error::InvalidRequest(format!("Invalid method {:?}: {}", method.as_ref(), e))
        })?;
        Self::new(method, url)
    }

    /// Adds a header to the request, replacing any earlier value.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.headers.insert(name, value);
        Ok(self)
    }

    /// Overlays a whole header map; later entries win.
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        overlay_headers(&mut self.headers, &headers);
        self
    }

    /// Appends a query parameter to the URL.
    pub fn with_query_param(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.url
            .query_pairs_mut()
            .append_pair(key.as_ref(), value.as_ref());
        self
    }

    /// Sets the body.
    pub fn with_body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = body.into();
        self
    }
}

/// Builds a header map from string pairs.
///
/// # Examples
///
/// ```
/// let headers = httputil::headers([("Accept", "text/html"), ("X-Trace", "1")]).unwrap();
/// assert_eq!(headers["accept"], "text/html");
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidRequest`] for an invalid name or value.
pub fn headers<I, K, V>(pairs: I) -> Result<HeaderMap>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        map.insert(name, value);
    }
    Ok(map)
}

pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::InvalidRequest(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::InvalidRequest(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

/// Overlays `overrides` onto `base`. Every name present in `overrides`
/// loses all of its values in `base` first.
pub(crate) fn overlay_headers(base: &mut HeaderMap, overrides: &HeaderMap) {
    for name in overrides.keys() {
        base.remove(name);
    }
    for (name, value) in overrides {
        base.append(name.clone(), value.clone());
    }
}
