//! Text generation backed by the Gemini REST API.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::{check_status, require_prompt, ServiceError, ServiceResult};
use crate::config::HubConfig;

/// Answer used when the model returns no text.
pub const EMPTY_ANSWER: &str = "No response generated.";

pub trait TextGenerator: Send + Sync {
    fn generate_text(&self, prompt: &str) -> impl Future<Output = ServiceResult<String>> + Send;
}

#[derive(Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("GeminiClient")
            .field("api_key", &"[REDACTED]")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> ServiceResult<Self> {
        let api_key = api_key.into().trim().to_string();
        if api_key.is_empty() {
            return Err(ServiceError::NotConfigured("GEMINI_API_KEY"));
        }
        Ok(Self {
            client: reqwest::Client::builder().timeout(timeout).build()?,
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Build from config; fails with `NotConfigured` when no key is set.
    pub fn from_config(config: &HubConfig) -> ServiceResult<Self> {
        let api_key = config
            .gemini_api_key
            .clone()
            .ok_or(ServiceError::NotConfigured("GEMINI_API_KEY"))?;
        Self::new(
            api_key,
            config.gemini_model.clone(),
            config.gemini_api_base_url.clone(),
            config.http_timeout,
        )
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}

impl TextGenerator for GeminiClient {
    async fn generate_text(&self, prompt: &str) -> ServiceResult<String> {
        let prompt = require_prompt(prompt)?;
        tracing::debug!(model = %self.model, "Requesting text generation");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await?;
        let response = check_status(response).await?;
        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|error| ServiceError::InvalidPayload(error.to_string()))?;
        Ok(body.answer())
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

impl<'a> GenerateRequest<'a> {
    fn from_prompt(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn answer(self) -> String {
        let text: String = self
            .candidates
            .into_iter()
            .next()
            .and_then(|candidate| candidate.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            EMPTY_ANSWER.to_string()
        } else {
            text
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn client() -> GeminiClient {
        GeminiClient::new(
            "sensitive-key",
            "gemini-3-flash-preview",
            "https://generativelanguage.googleapis.com/",
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn missing_key_is_not_configured() {
        let err = GeminiClient::new(" ", "m", "https://x", Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, ServiceError::NotConfigured(_)));
    }

    #[test]
    fn endpoint_includes_model() {
        assert_eq!(
            client().endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    #[test]
    fn debug_hides_key() {
        assert!(!format!("{:?}", client()).contains("sensitive-key"));
    }

    #[test]
    fn request_body_shape() {
        let body = serde_json::to_value(GenerateRequest::from_prompt("hi")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"contents": [{"parts": [{"text": "hi"}]}]})
        );
    }

    #[test]
    fn answer_joins_parts_of_first_candidate() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"Hello, "},{"text":"world"}]}},
                {"content":{"parts":[{"text":"ignored"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(response.answer(), "Hello, world");
    }

    #[test]
    fn empty_answer_has_placeholder() {
        let response: GenerateResponse = serde_json::from_str(r#"{"candidates":[]}"#).unwrap();
        assert_eq!(response.answer(), EMPTY_ANSWER);
        assert_eq!(GenerateResponse::default().answer(), EMPTY_ANSWER);
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected_before_request() {
        let err = client().generate_text("   ").await.unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
