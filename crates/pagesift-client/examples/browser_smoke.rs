/// Smoke-test for `BrowserFetcher`.
///
/// Launches a headless Chromium, fetches <https://example.com> with a short
/// navigation timeout, and verifies a result comes back either way — the
/// timeout path must return partial content, not an error.
///
/// Run with:
///   cargo run --example browser_smoke
use std::time::Duration;

use pagesift_client::BrowserFetcher;
use pagesift_core::traits::Fetcher;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    println!("Launching headless browser…");
    let fetcher = BrowserFetcher::new().with_timeout(Duration::from_secs(10));

    let url = "https://example.com";
    println!("Fetching {url} …");
    let html = fetcher.fetch(url).await?;

    assert!(
        html.contains("Example Domain"),
        "Expected heading not found in rendered HTML"
    );

    println!("OK — got {} bytes of rendered HTML", html.len());
    Ok(())
}
