use std::future::Future;

use crate::error::PipelineError;
use crate::schema::FieldSchema;

/// Fetches the rendered HTML of a URL.
pub trait Fetcher: Send + Sync + Clone {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<String, PipelineError>> + Send;
}

/// Converts raw HTML into text suitable for LLM input.
///
/// Implementations must be pure: same HTML in, same text out, no I/O.
pub trait Normalizer: Send + Sync + Clone {
    fn normalize(&self, html: &str) -> Result<String, PipelineError>;
}

/// Extracts structured data from text content using an LLM.
pub trait Extractor: Send + Sync + Clone {
    /// Sends the content and field schema to the LLM and returns the
    /// extracted JSON object.
    fn extract(
        &self,
        content: &str,
        schema: &FieldSchema,
    ) -> impl Future<Output = Result<serde_json::Value, PipelineError>> + Send;
}
