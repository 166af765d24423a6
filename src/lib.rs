//! # httputil - small HTTP helpers with bounded retries
//!
//! `httputil` wraps `reqwest` with the handful of calls most scripts and
//! services actually need: fetch bytes, exchange JSON, stream a body into a
//! file. Transport failures are retried a fixed number of times; everything
//! that happens after a response arrives is reported, never retried.
//!
//! ## Quick Start
//!
//! ```no_run
//! use httputil::{Client, Request};
//! use http::Method;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct CreateUser {
//!     name: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), httputil::Error> {
//!     // Two retries: up to three deliveries per request
//!     let client = Client::builder().max_retries(2).build()?;
//!
//!     // Raw bytes
//!     let page = client.get("https://example.com/", Default::default()).await?;
//!     println!("{} bytes", page.data.len());
//!
//!     // JSON in, JSON out
//!     let new_user = CreateUser { name: "Alice".to_string() };
//!     let user = client
//!         .post_json::<_, User>("https://api.example.com/users", &new_user, Default::default())
//!         .await?;
//!     println!("created {} ({})", user.data.name, user.data.id);
//!
//!     // Straight to disk
//!     let request = Request::new(Method::GET, "https://example.com/big.iso")?;
//!     let saved = client.download("big.iso", request).await?;
//!     println!("saved {} bytes", saved.data);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Retries
//!
//! A client with `max_retries = n` delivers each request at most `n + 1`
//! times, and only when the previous attempt failed at the transport level
//! (connection refused, reset, timeout, DNS). Request bodies are
//! [`RequestBody`] values that can be replayed for every attempt. Retries
//! don't deduplicate: a retried POST may reach the server twice.
//!
//! The default budget is one retry with no delay; see [`Backoff`] for
//! spacing attempts out.
//!
//! ## Error Handling
//!
//! ```no_run
//! use httputil::{Client, Error};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().build()?;
//! match client.get_json::<serde_json::Value>("https://api.example.com/x", Default::default()).await {
//!     Ok(response) => println!("Success: {:?}", response.data),
//!     Err(Error::DeserializationFailed { raw_response, serde_error, status }) => {
//!         eprintln!("Bad JSON (status {}): {} in {}", status, serde_error, raw_response);
//!     }
//!     Err(Error::HttpError { status, .. }) => eprintln!("HTTP error {}", status),
//!     Err(Error::ContentLengthMismatch { expected, actual }) => {
//!         eprintln!("Truncated: {} of {} bytes", actual, expected);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Process-wide helpers
//!
//! The [`global`] module mirrors the client API as free functions over one
//! shared client, for code that doesn't want to carry a [`Client`] around.

mod client;
mod config;
mod download;
mod error;
pub mod global;
mod json;
mod request;
mod response;
pub mod retry;

pub use client::{Client, ClientBuilder};
pub use config::{ClientConfig, CONTENT_TYPE_JSON, DEFAULT_PROXY_URL, DEFAULT_USER_AGENT};
pub use error::{Error, Result};
pub use json::SNIPPET_LIMIT;
pub use request::{headers, Request, RequestBody};
pub use response::Response;
pub use retry::{Backoff, RetryPolicy};
