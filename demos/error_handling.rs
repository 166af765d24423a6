//! Example demonstrating error handling.
//!
//! This example shows how to:
//! - Tell status errors from transport errors
//! - Inspect the truncated body of a deserialization failure
//! - Check which errors were eligible for retry
//!
//! Run with: `cargo run --example error_handling`

use http::HeaderMap;
use httputil::{Client, Error};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    id: u32,
    title: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("httputil=info")
        .init();

    let client = Client::builder().max_retries(1).build()?;

    println!("=== Example 1: Status errors ===");
    match client
        .get_json::<Post>(
            "https://jsonplaceholder.typicode.com/posts/999999",
            HeaderMap::new(),
        )
        .await
    {
        Ok(response) => println!("Success: {:?}", response.data),
        Err(Error::HttpError {
            status,
            raw_response,
            headers,
        }) => {
            println!("HTTP Error!");
            println!("  Status: {}", status);
            println!("  Raw response: {}", raw_response);
            println!("  Content-Type: {:?}", headers.get("content-type"));
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 2: Deserialization errors ===");
    match client
        .get_json::<Post>("https://www.rust-lang.org/", HeaderMap::new())
        .await
    {
        Ok(_) => println!("Unexpected success"),
        Err(Error::DeserializationFailed {
            raw_response,
            serde_error,
            status,
        }) => {
            println!("Deserialization Failed!");
            println!("  Status: {}", status);
            println!("  Serde error: {}", serde_error);
            println!("  Quoted body: {} bytes", raw_response.len());
        }
        Err(e) => println!("Other error: {}", e),
    }
    println!();

    println!("=== Example 3: Transport errors ===");
    match client.get("http://127.0.0.1:9/", HeaderMap::new()).await {
        Ok(_) => println!("Unexpected success"),
        Err(e) => {
            println!("Error: {}", e);
            println!("  Retryable: {}", e.is_retryable());
            println!("  Timeout: {}", e.is_timeout());
        }
    }

    Ok(())
}
