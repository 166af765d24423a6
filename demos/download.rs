//! Downloads a URL to a file through the process-wide helpers.
//!
//! Run with: `cargo run --example download -- <url> <path> [proxy]`

use http::{HeaderMap, Method};
use httputil::global;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("httputil=info")
        .init();

    let mut args = std::env::args().skip(1);
    let url = args
        .next()
        .unwrap_or_else(|| "https://www.rust-lang.org/logos/rust-logo-512x512.png".to_string());
    let path = args.next().unwrap_or_else(|| "download.bin".to_string());

    if let Some(proxy) = args.next() {
        global::set_proxy(&proxy)?;
    }
    global::set_retries(3)?;

    let written = global::download(&path, Method::GET, &url, "", HeaderMap::new()).await?;
    println!("Saved {} bytes from {} to {}", written, url, path);

    Ok(())
}
