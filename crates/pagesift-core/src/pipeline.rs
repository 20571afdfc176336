use crate::error::PipelineError;
use crate::models::ExtractionResult;
use crate::schema::FieldSchema;
use crate::traits::{Extractor, Fetcher, Normalizer};

/// Orchestrates the full run: fetch → normalize → extract → conform.
///
/// Generic over all external dependencies via traits, enabling dependency
/// injection and testability without a real browser or LLM. Holds no state
/// across runs; each [`run`](Self::run) is independent.
pub struct Pipeline<F, N, E>
where
    F: Fetcher,
    N: Normalizer,
    E: Extractor,
{
    fetcher: F,
    normalizer: N,
    extractor: E,
    model_name: String,
}

impl<F, N, E> Pipeline<F, N, E>
where
    F: Fetcher,
    N: Normalizer,
    E: Extractor,
{
    pub fn new(fetcher: F, normalizer: N, extractor: E, model_name: String) -> Self {
        Self {
            fetcher,
            normalizer,
            extractor,
            model_name,
        }
    }

    /// Run the pipeline for a URL + schema.
    ///
    /// 1. Fetch rendered HTML from the URL
    /// 2. Normalize HTML to text
    /// 3. Extract structured data via the LLM
    /// 4. Conform the reply to the schema
    pub async fn run(
        &self,
        url: &str,
        schema: &FieldSchema,
    ) -> Result<ExtractionResult, PipelineError> {
        tracing::info!("Fetching {}", url);
        let html = self.fetcher.fetch(url).await?;
        tracing::info!("Fetched {} bytes of HTML", html.len());

        let text = self.normalizer.normalize(&html)?;
        // Markdown escaping can make the output longer than the input, so
        // the reduction saturates at 0% rather than underflowing.
        let reduction = if html.is_empty() {
            0
        } else {
            100usize.saturating_sub(text.len() * 100 / html.len())
        };
        tracing::info!(
            "Normalized to {} bytes of text ({}% reduction)",
            text.len(),
            reduction
        );
        // A page with no visible text is not an error; the model simply
        // gets nothing to work with.
        if text.is_empty() {
            tracing::warn!("Page yielded no visible text");
        }

        tracing::info!("Extracting {} fields with model {} ...", schema.len(), self.model_name);
        let extracted = self.extractor.extract(&text, schema).await?;

        let data = schema.conform(extracted)?;
        tracing::info!("Extraction complete");

        Ok(ExtractionResult {
            url: url.to_string(),
            model: self.model_name.clone(),
            data,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::*;

    fn title_schema() -> FieldSchema {
        FieldSchema::from_value(&serde_json::json!({"title": "string"})).unwrap()
    }

    #[tokio::test]
    async fn happy_path() {
        let extracted = serde_json::json!({"title": "Hello"});
        let pipeline = Pipeline::new(
            MockFetcher::new("<html><body><h1>Hello</h1></body></html>"),
            MockNormalizer::passthrough(),
            MockExtractor::new(extracted.clone()),
            "test-model".into(),
        );

        let result = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap();

        assert_eq!(result.data, extracted);
        assert_eq!(result.url, "https://example.com");
        assert_eq!(result.model, "test-model");
    }

    #[tokio::test]
    async fn stub_extractor_returns_stock_fields() {
        // Fixed schema + fixed text, stubbed extraction capability.
        let schema = FieldSchema::from_value(&serde_json::json!({
            "market_cap": "string",
            "revenue": "string",
        }))
        .unwrap();
        let extractor =
            MockExtractor::new(serde_json::json!({"market_cap": "1.2T", "revenue": "300B"}));

        let pipeline = Pipeline::new(
            MockFetcher::new("Market Cap 1.2T Revenue 300B"),
            MockNormalizer::passthrough(),
            extractor.clone(),
            "test-model".into(),
        );

        let result = pipeline
            .run("https://stockanalysis.com/stocks/googl/", &schema)
            .await
            .unwrap();

        assert_eq!(result.data["market_cap"], "1.2T");
        assert_eq!(result.data["revenue"], "300B");
        // The extractor saw the normalized text, not the raw HTML.
        assert_eq!(
            extractor.calls.lock().unwrap()[0],
            "Market Cap 1.2T Revenue 300B"
        );
    }

    #[tokio::test]
    async fn missing_fields_become_null() {
        let schema = FieldSchema::from_value(&serde_json::json!({
            "title": "string",
            "author": "string",
        }))
        .unwrap();

        let pipeline = Pipeline::new(
            MockFetcher::new("<html></html>"),
            MockNormalizer::passthrough(),
            MockExtractor::new(serde_json::json!({"title": "Hello"})),
            "test-model".into(),
        );

        let result = pipeline.run("https://example.com", &schema).await.unwrap();

        assert_eq!(result.data["title"], "Hello");
        assert_eq!(result.data["author"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn normalized_text_longer_than_page_is_not_an_error() {
        // Markdown escaping can expand the input ("*" becomes "\*"), so the
        // normalized text may exceed the fetched document in size.
        let pipeline = Pipeline::new(
            MockFetcher::new("*"),
            MockNormalizer::with_output("\\*"),
            MockExtractor::new(serde_json::json!({"title": null})),
            "test-model".into(),
        );

        let result = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap();

        assert_eq!(result.data["title"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn empty_page_is_not_an_error() {
        let pipeline = Pipeline::new(
            MockFetcher::new(""),
            MockNormalizer::passthrough(),
            MockExtractor::new(serde_json::json!({"title": null})),
            "test-model".into(),
        );

        let result = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap();

        assert_eq!(result.data["title"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn fetch_error_propagates() {
        let pipeline = Pipeline::new(
            MockFetcher::with_error(PipelineError::Http("connection refused".into())),
            MockNormalizer::passthrough(),
            MockExtractor::new(serde_json::json!({})),
            "test-model".into(),
        );

        let err = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Http(_)));
    }

    #[tokio::test]
    async fn normalize_error_propagates() {
        let pipeline = Pipeline::new(
            MockFetcher::new("<html></html>"),
            MockNormalizer::with_error(PipelineError::Normalize("bad html".into())),
            MockExtractor::new(serde_json::json!({})),
            "test-model".into(),
        );

        let err = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Normalize(_)));
    }

    #[tokio::test]
    async fn extract_error_propagates() {
        let pipeline = Pipeline::new(
            MockFetcher::new("<html></html>"),
            MockNormalizer::passthrough(),
            MockExtractor::with_error(PipelineError::Llm {
                message: "invalid api key".into(),
                status_code: 401,
            }),
            "test-model".into(),
        );

        let err = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Llm { .. }));
    }

    #[tokio::test]
    async fn non_object_extraction_is_schema_error() {
        let pipeline = Pipeline::new(
            MockFetcher::new("<html></html>"),
            MockNormalizer::passthrough(),
            MockExtractor::new(serde_json::json!("not an object")),
            "test-model".into(),
        );

        let err = pipeline
            .run("https://example.com", &title_schema())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Schema(_)));
    }
}
