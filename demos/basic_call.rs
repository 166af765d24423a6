//! Basic example demonstrating byte and JSON requests.
//!
//! This example shows how to:
//! - Create a client with a retry budget
//! - Fetch raw bytes with GET
//! - Exchange JSON with POST
//! - Read response metadata
//!
//! Run with: `cargo run --example basic_call`

use http::HeaderMap;
use httputil::{Client, Error};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct Post {
    #[serde(rename = "userId")]
    user_id: u32,
    id: u32,
    title: String,
    body: String,
}

#[derive(Debug, Serialize)]
struct NewPost {
    title: String,
    body: String,
    #[serde(rename = "userId")]
    user_id: u32,
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter("httputil=debug,basic_call=info")
        .init();

    let client = Client::builder().max_retries(2).build()?;

    println!("=== GET bytes ===");
    let page = client
        .get("https://jsonplaceholder.typicode.com/posts/1", HeaderMap::new())
        .await?;
    println!("Received {} bytes", page.data.len());
    println!("Content-Type: {:?}", page.header("content-type"));
    println!("Attempts: {}", page.attempts);
    println!();

    println!("=== GET JSON ===");
    let post = client
        .get_json::<Post>("https://jsonplaceholder.typicode.com/posts/1", HeaderMap::new())
        .await?;
    println!("Title: {}", post.data.title);
    println!("Request latency: {:?}", post.latency);
    println!();

    println!("=== POST JSON ===");
    let new_post = NewPost {
        title: "My New Post".to_string(),
        body: "This is the content of my new post!".to_string(),
        user_id: 1,
    };
    let created = client
        .post_json::<_, Post>(
            "https://jsonplaceholder.typicode.com/posts",
            &new_post,
            HeaderMap::new(),
        )
        .await?;
    println!("Created post ID: {}", created.data.id);
    println!("Status code: {}", created.status);
    println!("Was retried: {}", created.was_retried());

    Ok(())
}
