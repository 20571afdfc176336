use std::time::Duration;

use pagesift_core::error::PipelineError;
use pagesift_core::traits::Fetcher;
use reqwest::Client;
use url::Url;

/// Plain HTTP fetcher using reqwest.
///
/// Downloads raw HTML without rendering JavaScript. Sufficient for static
/// pages and much cheaper than [`crate::BrowserFetcher`]; unlike the
/// browser path, a timeout here is fatal since there is no partially
/// rendered document to fall back on.
#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, PipelineError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, PipelineError> {
        let timeout_secs = timeout.as_secs();
        let client = Client::builder()
            .user_agent("pagesift/0.1")
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Http(e.to_string()))?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }
}

impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, PipelineError> {
        validate_url(url)?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                PipelineError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                PipelineError::Network(format!("Connection failed: {e}"))
            } else {
                PipelineError::Http(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Http(format!(
                "HTTP {} for {}",
                status.as_u16(),
                url
            )));
        }

        response
            .text()
            .await
            .map_err(|e| PipelineError::Http(format!("Failed to read response body: {e}")))
    }
}

/// Check that a target URL is syntactically valid before any fetch starts.
///
/// Only http/https with a host are accepted; anything else is a
/// configuration error, caught before a browser process is spawned.
pub fn validate_url(url: &str) -> Result<(), PipelineError> {
    let parsed =
        Url::parse(url).map_err(|e| PipelineError::Config(format!("Invalid URL '{url}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(PipelineError::Config(format!(
                "URL scheme '{scheme}' is not allowed (only http/https)"
            )));
        }
    }

    if parsed.host_str().is_none() {
        return Err(PipelineError::Config(format!("URL '{url}' has no host")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url_accepts_http_and_https() {
        assert!(validate_url("https://example.com").is_ok());
        assert!(validate_url("http://example.com/path?q=1").is_ok());
    }

    #[test]
    fn test_validate_url_rejects_bad_scheme() {
        let err = validate_url("file:///etc/passwd").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_validate_url_rejects_garbage() {
        assert!(validate_url("not a url").is_err());
        assert!(validate_url("").is_err());
    }
}
