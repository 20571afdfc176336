use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::error::CdpError;
use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use pagesift_core::error::PipelineError;
use pagesift_core::traits::Fetcher;

use crate::fetcher::validate_url;

const DEFAULT_NAV_TIMEOUT: Duration = Duration::from_secs(30);

/// Headless-browser fetcher using Chromium via the Chrome DevTools Protocol.
///
/// Renders JavaScript before returning the HTML, making it suitable for
/// SPAs and pages with lazy-loaded content. A fresh Chromium process is
/// launched per [`Fetcher::fetch`] call and torn down on every exit path,
/// including the navigation-timeout path.
///
/// The navigation timeout is deliberately **non-fatal**: if the page has
/// not settled within the window, the fetch logs a warning and proceeds
/// with whatever content has rendered so far.
#[derive(Clone)]
pub struct BrowserFetcher {
    timeout: Duration,
    headless: bool,
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl BrowserFetcher {
    /// A headless fetcher with a **30 s** navigation timeout.
    ///
    /// Requires a Chromium / Chrome binary reachable via `$PATH` (or the
    /// default locations checked by `chromiumoxide`).
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_NAV_TIMEOUT,
            headless: true,
        }
    }

    /// Set a custom navigation timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run the browser with a visible window instead of headless.
    pub fn with_head(mut self) -> Self {
        self.headless = false;
        self
    }

    fn config(&self) -> Result<BrowserConfig, PipelineError> {
        let mut builder = BrowserConfig::builder().no_sandbox().disable_default_args();

        // Snap-packaged Chromium exposes a wrapper that rejects standard
        // Chrome CLI flags. Try to locate the real binary first, falling
        // back to any other Chrome/Chromium on the system.
        if let Some(bin) = find_chrome_binary() {
            tracing::debug!("Using Chrome binary: {}", bin.display());
            builder = builder.chrome_executable(bin);
        }

        if self.headless {
            builder = builder.arg("--headless=new").arg("--disable-gpu");
        } else {
            builder = builder.with_head();
        }

        builder
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--disable-popup-blocking")
            .arg("--no-first-run")
            .build()
            .map_err(|e| PipelineError::Browser(format!("Browser config error: {e}")))
    }

    /// Navigate and serialize the page inside an already-running browser.
    ///
    /// Timeout and navigation-error handling live here; process teardown is
    /// the caller's job so it happens exactly once on every path.
    async fn render(&self, browser: &Browser, url: &str) -> Result<String, PipelineError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| PipelineError::Browser(format!("Failed to open page: {e}")))?;

        let navigation = tokio::time::timeout(self.timeout, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<(), CdpError>(())
        })
        .await;

        match classify_navigation(navigation.ok()) {
            NavOutcome::Settled => {}
            // Best effort: take whatever rendered within the window.
            NavOutcome::TimedOut => tracing::warn!(
                "Navigation to {url} did not settle within {}s, proceeding with available content",
                self.timeout.as_secs()
            ),
            NavOutcome::Failed(e) => {
                return Err(PipelineError::Http(format!(
                    "Failed to navigate to {url}: {e}"
                )));
            }
        }

        let html = page
            .content()
            .await
            .map_err(|e| PipelineError::Browser(format!("Failed to read page content: {e}")))?;

        let _ = page.close().await;
        Ok(html)
    }
}

impl Fetcher for BrowserFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        validate_url(url)?;

        let (mut browser, mut handler) = Browser::launch(self.config()?)
            .await
            .map_err(|e| PipelineError::Browser(format!("Failed to launch browser: {e}")))?;

        // The CDP handler must be polled continuously for the connection
        // to work.
        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    tracing::warn!("Browser CDP handler error: {event:?}");
                    break;
                }
            }
        });

        let result = self.render(&browser, url).await;

        // The browser process is released exactly once, on every exit path.
        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser: {e}");
        }
        let _ = browser.wait().await;
        handler_task.abort();

        result
    }
}

/// What a navigation attempt means for the fetch.
#[derive(Debug)]
enum NavOutcome {
    /// Page settled within the window.
    Settled,
    /// Window elapsed (or the CDP request timed out): proceed with
    /// whatever content has rendered.
    TimedOut,
    /// Navigation itself failed: the fetch fails.
    Failed(CdpError),
}

/// Classify a navigation result; `None` means the outer timeout elapsed.
fn classify_navigation(nav: Option<Result<(), CdpError>>) -> NavOutcome {
    match nav {
        Some(Ok(())) => NavOutcome::Settled,
        None | Some(Err(CdpError::Timeout)) => NavOutcome::TimedOut,
        Some(Err(e)) => NavOutcome::Failed(e),
    }
}

/// Tries to locate the real Chrome/Chromium binary.
///
/// On systems where Chromium is installed via snap, the wrapper at
/// `/snap/bin/chromium` strips unknown CLI flags, breaking headless mode.
/// Look for the real binary inside the snap first, then fall back to
/// well-known system paths. `None` lets `chromiumoxide` do its own lookup.
fn find_chrome_binary() -> Option<PathBuf> {
    if let Ok(p) = std::env::var("CHROME_BIN") {
        let path = PathBuf::from(&p);
        if path.exists() {
            return Some(path);
        }
    }

    let candidates: &[&str] = &[
        "/snap/chromium/current/usr/lib/chromium-browser/chrome",
        "/var/lib/flatpak/exports/bin/org.chromium.Chromium",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/google-chrome",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
    ];

    candidates.iter().map(PathBuf::from).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settled_navigation_proceeds() {
        assert!(matches!(
            classify_navigation(Some(Ok(()))),
            NavOutcome::Settled
        ));
    }

    #[test]
    fn test_elapsed_window_is_non_fatal() {
        // The fetch still returns a result; the caller serializes whatever
        // rendered before the window closed.
        assert!(matches!(classify_navigation(None), NavOutcome::TimedOut));
    }

    #[test]
    fn test_cdp_timeout_is_non_fatal() {
        assert!(matches!(
            classify_navigation(Some(Err(CdpError::Timeout))),
            NavOutcome::TimedOut
        ));
    }

    #[test]
    fn test_other_cdp_error_fails_the_fetch() {
        let err = CdpError::from(std::io::Error::other("tab crashed"));
        assert!(matches!(
            classify_navigation(Some(Err(err))),
            NavOutcome::Failed(_)
        ));
    }
}
