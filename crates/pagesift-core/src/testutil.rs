//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls.

use std::sync::{Arc, Mutex};

use crate::error::PipelineError;
use crate::schema::FieldSchema;
use crate::traits::{Extractor, Fetcher, Normalizer};

// ---------------------------------------------------------------------------
// MockFetcher
// ---------------------------------------------------------------------------

/// Mock fetcher that returns a configurable response.
#[derive(Clone)]
pub struct MockFetcher {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns a default HTML string.
    responses: Arc<Mutex<Vec<Result<String, PipelineError>>>>,
}

impl MockFetcher {
    pub fn new(html: &str) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(html.to_string())])),
        }
    }

    pub fn with_error(error: PipelineError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
        }
    }
}

impl Fetcher for MockFetcher {
    async fn fetch(&self, _url: &str) -> Result<String, PipelineError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok("<html><body>default</body></html>".to_string())
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// MockNormalizer
// ---------------------------------------------------------------------------

/// Mock normalizer that passes input through unchanged, returns a fixed
/// output, or fails.
#[derive(Clone)]
pub struct MockNormalizer {
    error: Arc<Mutex<Option<PipelineError>>>,
    output: Option<String>,
}

impl MockNormalizer {
    /// Creates a normalizer that returns the input unchanged.
    pub fn passthrough() -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
            output: None,
        }
    }

    /// Creates a normalizer that returns a fixed output regardless of input.
    pub fn with_output(output: &str) -> Self {
        Self {
            error: Arc::new(Mutex::new(None)),
            output: Some(output.to_string()),
        }
    }

    /// Creates a normalizer that returns an error.
    pub fn with_error(error: PipelineError) -> Self {
        Self {
            error: Arc::new(Mutex::new(Some(error))),
            output: None,
        }
    }
}

impl Normalizer for MockNormalizer {
    fn normalize(&self, html: &str) -> Result<String, PipelineError> {
        let mut err = self.error.lock().unwrap();
        if let Some(e) = err.take() {
            return Err(e);
        }
        match &self.output {
            Some(output) => Ok(output.clone()),
            None => Ok(html.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns configurable JSON and records the content
/// it was given.
#[derive(Clone)]
pub struct MockExtractor {
    responses: Arc<Mutex<Vec<Result<serde_json::Value, PipelineError>>>>,
    /// Content strings passed to [`Extractor::extract`], in call order.
    pub calls: Arc<Mutex<Vec<String>>>,
}

impl MockExtractor {
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Ok(data)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_error(error: PipelineError) -> Self {
        Self {
            responses: Arc::new(Mutex::new(vec![Err(error)])),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Extractor for MockExtractor {
    async fn extract(
        &self,
        content: &str,
        _schema: &FieldSchema,
    ) -> Result<serde_json::Value, PipelineError> {
        self.calls.lock().unwrap().push(content.to_string());
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(serde_json::json!({}))
        } else {
            responses.remove(0)
        }
    }
}
