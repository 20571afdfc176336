use std::time::Duration;

use pagesift_core::error::PipelineError;
use pagesift_core::schema::FieldSchema;
use pagesift_core::traits::Extractor;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_LLM_TIMEOUT: Duration = Duration::from_secs(120);
const SYSTEM_PROMPT: &str = "You are a data extraction assistant. Extract the requested fields from the provided page text. Respond ONLY with valid JSON matching the requested schema. Use an empty string for any field you cannot find. Do not include explanations.";

/// OpenAI-compatible LLM client for structured extraction.
///
/// Works with any OpenAI-compatible chat completions API. Requests run at
/// temperature 0 — the most deterministic setting the API offers, though
/// the model may still vary between runs. A failed call is terminal for
/// the run; there is no retry.
#[derive(Clone)]
pub struct OpenAiExtractor {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl OpenAiExtractor {
    pub fn new(api_key: &str, model: &str) -> Result<Self, PipelineError> {
        Self::with_base_url(api_key, model, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, model: &str, base_url: &str) -> Result<Self, PipelineError> {
        Self::build(api_key, model, base_url, DEFAULT_LLM_TIMEOUT)
    }

    pub fn with_timeout(self, timeout: Duration) -> Result<Self, PipelineError> {
        Self::build(&self.api_key, &self.model, &self.base_url, timeout)
    }

    fn build(
        api_key: &str,
        model: &str,
        base_url: &str,
        timeout: Duration,
    ) -> Result<Self, PipelineError> {
        if api_key.trim().is_empty() {
            return Err(PipelineError::Config("API key is empty".into()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PipelineError::Http(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            timeout_secs: timeout.as_secs(),
        })
    }
}

// ---- OpenAI API types ----

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
    json_schema: JsonSchemaWrapper,
}

#[derive(Serialize)]
struct JsonSchemaWrapper {
    name: String,
    strict: bool,
    schema: serde_json::Value,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

fn user_prompt(schema_json: &serde_json::Value, content: &str) -> String {
    format!(
        "Extract data according to this JSON schema:\n```json\n{}\n```\n\nFrom the following page text:\n\n{}",
        serde_json::to_string_pretty(schema_json).unwrap_or_else(|_| schema_json.to_string()),
        content
    )
}

impl Extractor for OpenAiExtractor {
    async fn extract(
        &self,
        content: &str,
        schema: &FieldSchema,
    ) -> Result<serde_json::Value, PipelineError> {
        let url = format!("{}/chat/completions", self.base_url);
        let schema_json = schema.to_json_schema();

        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: SYSTEM_PROMPT.to_string(),
                },
                Message {
                    role: "user".to_string(),
                    content: user_prompt(&schema_json, content),
                },
            ],
            temperature: 0.0,
            response_format: ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchemaWrapper {
                    name: "extraction".to_string(),
                    strict: true,
                    schema: schema_json,
                },
            },
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
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
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            return Err(PipelineError::Llm {
                message,
                status_code,
            });
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Http(format!("Failed to parse LLM response: {e}")))?;

        let content_str = chat_response
            .choices
            .first()
            .and_then(|c| c.message.content.as_ref())
            .ok_or_else(|| PipelineError::Llm {
                message: "Empty response from LLM".into(),
                status_code: 200,
            })?;

        serde_json::from_str(content_str).map_err(|e| {
            PipelineError::Schema(format!(
                "LLM returned invalid JSON: {e}. Raw: {content_str}"
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_carries_schema_and_content() {
        let schema =
            FieldSchema::from_value(&serde_json::json!({"market_cap": "string"})).unwrap();
        let prompt = user_prompt(&schema.to_json_schema(), "Market Cap 1.2T");
        assert!(prompt.contains("market_cap"));
        assert!(prompt.contains("Market Cap 1.2T"));
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let err = OpenAiExtractor::new("  ", "gpt-4o-mini").err().unwrap();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let extractor =
            OpenAiExtractor::with_base_url("key", "gpt-4o-mini", "https://api.test.com/v1/")
                .unwrap();
        assert_eq!(extractor.base_url, "https://api.test.com/v1");
    }
}
