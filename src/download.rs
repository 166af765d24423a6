//! Streaming response bodies into writers and files.

use std::path::Path;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    client::{check_content_length, http_error, is_error_status, next_chunk, Delivered},
    json::{snippet, SNIPPET_LIMIT},
    Client, Request, Response, Result,
};

impl Client {
    /// Sends a request and copies the response body into `dst` chunk by
    /// chunk instead of buffering it.
    ///
    /// Delivery is retried exactly as in [`Client::execute`]. A 4xx/5xx
    /// response writes nothing to `dst` and yields
    /// [`Error::HttpError`](crate::Error::HttpError) quoting at most the
    /// first kilobyte of the error body. After the copy `dst` is flushed and
    /// the byte count is checked against `Content-Length`.
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// A connection that closes before the declared `Content-Length` yields
    /// [`Error::ContentLengthMismatch`](crate::Error::ContentLengthMismatch);
    /// other mid-body transport failures yield
    /// [`Error::Network`](crate::Error::Network) and a failing `dst` yields
    /// [`Error::Io`](crate::Error::Io). None of these is retried, since `dst`
    /// may already hold part of the body.
    pub async fn request_and_write_to<W>(&self, dst: &mut W, request: Request) -> Result<Response<u64>>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let Delivered {
            mut response,
            attempts,
            started,
        } = self.send(&request).await?;

        let status = response.status();
        let headers = response.headers().clone();

        if is_error_status(status) {
            let mut prefix = Vec::new();
            // the status is the error; a body that breaks off only shortens the quote
            while prefix.len() < SNIPPET_LIMIT {
                match response.chunk().await {
                    Ok(Some(chunk)) => prefix.extend_from_slice(&chunk),
                    Ok(None) | Err(_) => break,
                }
            }
            return Err(http_error(status, snippet(&prefix), headers));
        }

        let expected = response.content_length();
        let mut written: u64 = 0;
        while let Some(chunk) = next_chunk(&mut response, expected, written).await? {
            dst.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        dst.flush().await?;

        let latency = started.elapsed();
        tracing::info!(
            status = status.as_u16(),
            latency_ms = latency.as_millis(),
            attempts = attempts,
            bytes = written,
            "Streamed HTTP response"
        );

        check_content_length(expected, written)?;

        Ok(Response::new(written, status, headers, latency, attempts))
    }

    /// Sends a request and writes the response body to the file at `path`,
    /// creating or truncating it.
    ///
    /// The file is flushed and closed before this returns, whether the
    /// download succeeded or not. A failed download may leave a partial file
    /// behind.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use httputil::{Client, Request};
    /// use http::Method;
    ///
    /// # async fn example() -> Result<(), httputil::Error> {
    /// let client = Client::builder().build()?;
    /// let request = Request::new(Method::GET, "https://example.com/archive.tar.gz")?;
    /// let response = client.download("archive.tar.gz", request).await?;
    /// println!("saved {} bytes", response.data);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn download(&self, path: impl AsRef<Path>, request: Request) -> Result<Response<u64>> {
        let path = path.as_ref();
        let mut file = tokio::fs::File::create(path).await?;

        let result = self.request_and_write_to(&mut file, request).await;

        // tokio closes in the background when a write is still pending
        let flushed = file.flush().await;
        drop(file);

        if let Err(e) = &result {
            tracing::warn!(path = %path.display(), error = %e, "Download failed");
        }

        let response = result?;
        flushed?;
        Ok(response)
    }
}
