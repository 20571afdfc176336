use thiserror::Error;

/// Application-wide error types for pagesift.
///
/// Every variant is fatal for the current run: the pipeline carries no
/// retry policy. The one recoverable condition — a navigation timeout in
/// the browser fetcher — is handled inside the fetcher itself and never
/// surfaces here.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Browser process could not be launched, driven, or read.
    #[error("Browser error: {0}")]
    Browser(String),

    /// HTTP request failed (fetching a page).
    #[error("HTTP error: {0}")]
    Http(String),

    /// Network/connection error.
    #[error("Network error: {0}")]
    Network(String),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// LLM API call failed.
    #[error("LLM error (HTTP {status_code}): {message}")]
    Llm { message: String, status_code: u16 },

    /// HTML-to-text conversion failed.
    #[error("Normalizer error: {0}")]
    Normalize(String),

    /// Schema could not be loaded, or extracted data does not match it.
    #[error("Schema error: {0}")]
    Schema(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid run configuration (bad URL, missing API key, unreadable file).
    #[error("Configuration error: {0}")]
    Config(String),
}
