//! Typed JSON requests and responses.

use bytes::Bytes;
use http::{header::CONTENT_TYPE, HeaderMap, HeaderValue, Method};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    config::CONTENT_TYPE_JSON, request::overlay_headers, Client, Error, Request, Response, Result,
};

/// Bodies of at least this many bytes are truncated when quoted in a
/// [`Error::DeserializationFailed`].
pub const SNIPPET_LIMIT: usize = 1024;

const ELLIPSIS: &str = "...";

impl Client {
    /// Sends `body` as JSON and decodes the JSON response into `Res`.
    ///
    /// `Content-Type: application/json; charset=UTF-8` is set unless
    /// `headers` carries its own. A `None` body is sent as an empty body.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`Client::execute`], returns
    /// [`Error::SerializationFailed`] if `body` can't be encoded and
    /// [`Error::DeserializationFailed`] if the response isn't valid JSON for
    /// `Res`; the latter quotes at most the first kilobyte of the body.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use httputil::Client;
    /// use http::Method;
    /// use serde::{Deserialize, Serialize};
    ///
    /// #[derive(Serialize)]
    /// struct Query { term: String }
    ///
    /// #[derive(Deserialize)]
    /// struct Hits { total: u64 }
    ///
    /// # async fn example() -> Result<(), httputil::Error> {
    /// let client = Client::builder().build()?;
    /// let query = Query { term: "rust".to_string() };
    /// let hits = client
    ///     .json::<_, Hits>(Method::POST, "https://example.com/search", Some(&query), Default::default())
    ///     .await?;
    /// println!("{} hits", hits.data.total);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn json<Req, Res>(
        &self,
        method: Method,
        url: impl AsRef<str>,
        body: Option<&Req>,
        headers: HeaderMap,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        let payload = match body {
            Some(value) => {
                serde_json::to_vec(value).map_err(|e| Error::SerializationFailed(e.to_string()))?
            }
            None => Vec::new(),
        };

        let mut merged = HeaderMap::new();
        merged.insert(CONTENT_TYPE, HeaderValue::from_static(CONTENT_TYPE_JSON));
        overlay_headers(&mut merged, &headers);

        let request = Request::new(method, url)?
            .with_headers(merged)
            .with_body(payload);

        let response = self.execute(request).await?;
        decode(response)
    }

    /// Makes a GET request and decodes the JSON response.
    pub async fn get_json<Res>(&self, url: impl AsRef<str>, headers: HeaderMap) -> Result<Response<Res>>
    where
        Res: DeserializeOwned,
    {
        self.json::<(), Res>(Method::GET, url, None, headers).await
    }

    /// Makes a POST request with a JSON body and decodes the JSON response.
    pub async fn post_json<Req, Res>(
        &self,
        url: impl AsRef<str>,
        body: &Req,
        headers: HeaderMap,
    ) -> Result<Response<Res>>
    where
        Req: Serialize + ?Sized,
        Res: DeserializeOwned,
    {
        self.json(Method::POST, url, Some(body), headers).await
    }
}

pub(crate) fn decode<T>(response: Response<Bytes>) -> Result<Response<T>>
where
    T: DeserializeOwned,
{
    let parsed = serde_json::from_slice::<T>(&response.data);
    match parsed {
        Ok(data) => Ok(response.map(|_| data)),
        Err(e) => {
            let raw_response = snippet(&response.data);
            tracing::error!(
                error = %e,
                status = response.status.as_u16(),
                raw_response = %raw_response,
                "Failed to deserialize response"
            );

            Err(Error::DeserializationFailed {
                raw_response,
                serde_error: e.to_string(),
                status: response.status,
            })
        }
    }
}

/// Renders a body for an error message, cutting anything of
/// [`SNIPPET_LIMIT`] bytes or more down to its first
/// `SNIPPET_LIMIT - 2` bytes followed by `...`.
pub(crate) fn snippet(body: &[u8]) -> String {
    if body.len() < SNIPPET_LIMIT {
        return String::from_utf8_lossy(body).into_owned();
    }
    let mut text = String::from_utf8_lossy(&body[..SNIPPET_LIMIT - 2]).into_owned();
    text.push_str(ELLIPSIS);
    text
}
