//! Process-wide helper functions over one shared [`Client`].
//!
//! These exist for scripts and one-off calls. Everything here forwards to a
//! lazily built default client; code that wants its own retry budget or
//! proxy should build a [`Client`] and pass it around instead.
//!
//! Reconfiguration swaps the shared client. Requests already in flight keep
//! the client they started with; requests started afterwards see the new
//! one.
//!
//! ```no_run
//! # async fn example() -> Result<(), httputil::Error> {
//! httputil::global::set_retries(3)?;
//! let page = httputil::global::get("https://example.com/", Default::default()).await?;
//! println!("{} bytes", page.len());
//! # Ok(())
//! # }
//! ```

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{OnceLock, PoisonError, RwLock};

use bytes::Bytes;
use http::{HeaderMap, Method};
use serde::{de::DeserializeOwned, Serialize};
use tokio::io::AsyncWrite;

use crate::{Client, Request, RequestBody, Result};

static SHARED: OnceLock<RwLock<Client>> = OnceLock::new();
static PROXY_APPLIED: AtomicBool = AtomicBool::new(false);

fn slot() -> Result<&'static RwLock<Client>> {
    if let Some(slot) = SHARED.get() {
        return Ok(slot);
    }
    let client = Client::builder().build()?;
    // a concurrent initializer may win; its client is equivalent
    Ok(SHARED.get_or_init(|| RwLock::new(client)))
}

/// Returns a handle to the shared client.
///
/// # Errors
///
/// Fails only if the default client can't be built on first use.
pub fn shared() -> Result<Client> {
    let guard = slot()?.read().unwrap_or_else(PoisonError::into_inner);
    Ok(guard.clone())
}

/// Sets how many times the shared client retries a transport failure.
/// Total attempts become `max_retries + 1`. The connection pool is kept.
pub fn set_retries(max_retries: usize) -> Result<()> {
    let mut guard = slot()?.write().unwrap_or_else(PoisonError::into_inner);
    let next = guard.with_max_retries(max_retries);
    *guard = next;
    tracing::debug!(max_retries, "Shared client retry budget updated");
    Ok(())
}

/// Routes the shared client through a proxy. An empty URL selects
/// [`DEFAULT_PROXY_URL`](crate::DEFAULT_PROXY_URL).
///
/// Swapping the transport throws away the warmed connection pool, so only
/// the first successful call has any effect. Returns `Ok(true)` when the
/// proxy was applied and `Ok(false)` when an earlier call already did.
///
/// # Errors
///
/// Returns [`Error::ConfigurationError`](crate::Error::ConfigurationError)
/// for an invalid proxy URL. A failed call doesn't count as the one
/// allowed call.
pub fn set_proxy(proxy_url: &str) -> Result<bool> {
    let mut guard = slot()?.write().unwrap_or_else(PoisonError::into_inner);

    // only read or written under the write lock
    if PROXY_APPLIED.load(Ordering::SeqCst) {
        tracing::debug!(proxy_url, "Shared client proxy already set, ignoring");
        return Ok(false);
    }

    let next = guard.with_proxy(proxy_url)?;
    *guard = next;
    PROXY_APPLIED.store(true, Ordering::SeqCst);

    tracing::info!(proxy_url, "Shared client proxy set");
    Ok(true)
}

/// Sends a request through the shared client and returns the body.
pub async fn request(
    method: Method,
    url: impl AsRef<str>,
    body: impl Into<RequestBody>,
    headers: HeaderMap,
) -> Result<Bytes> {
    let client = shared()?;
    let response = client.request(method, url, body, headers).await?;
    Ok(response.data)
}

/// GET through the shared client.
pub async fn get(url: impl AsRef<str>, headers: HeaderMap) -> Result<Bytes> {
    request(Method::GET, url, RequestBody::Empty, headers).await
}

/// POST through the shared client.
pub async fn post(
    url: impl AsRef<str>,
    body: impl Into<RequestBody>,
    headers: HeaderMap,
) -> Result<Bytes> {
    request(Method::POST, url, body, headers).await
}

/// JSON request through the shared client. See [`Client::json`].
pub async fn json<Req, Res>(
    method: Method,
    url: impl AsRef<str>,
    body: Option<&Req>,
    headers: HeaderMap,
) -> Result<Res>
where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
{
    let client = shared()?;
    let response = client.json(method, url, body, headers).await?;
    Ok(response.data)
}

/// JSON GET through the shared client.
pub async fn get_json<Res>(url: impl AsRef<str>, headers: HeaderMap) -> Result<Res>
where
    Res: DeserializeOwned,
{
    json::<(), Res>(Method::GET, url, None, headers).await
}

/// JSON POST through the shared client.
pub async fn post_json<Req, Res>(url: impl AsRef<str>, body: &Req, headers: HeaderMap) -> Result<Res>
where
    Req: Serialize + ?Sized,
    Res: DeserializeOwned,
{
    json(Method::POST, url, Some(body), headers).await
}

/// Streams a response into `dst` through the shared client. Returns the
/// number of bytes written.
pub async fn request_and_write_to<W>(
    dst: &mut W,
    method: Method,
    url: impl AsRef<str>,
    body: impl Into<RequestBody>,
    headers: HeaderMap,
) -> Result<u64>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let request = Request::new(method, url)?
        .with_headers(headers)
        .with_body(body);
    let client = shared()?;
    let response = client.request_and_write_to(dst, request).await?;
    Ok(response.data)
}

/// Downloads a response into the file at `path` through the shared client.
/// Returns the number of bytes written.
pub async fn download(
    path: impl AsRef<Path>,
    method: Method,
    url: impl AsRef<str>,
    body: impl Into<RequestBody>,
    headers: HeaderMap,
) -> Result<u64> {
    let request = Request::new(method, url)?
        .with_headers(headers)
        .with_body(body);
    let client = shared()?;
    let response = client.download(path, request).await?;
    Ok(response.data)
}
