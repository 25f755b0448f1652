//! Gemini REST backend for title classification.

use crate::classify::TextModel;
use crate::error::{ScrapeError, ScrapeResult};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

/// Default model when none is configured.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Default API base for the generateContent endpoint.
pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Client for the Gemini generateContent API.
pub struct GeminiClient {
    api_key: String,
    api_url: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
            client: reqwest::Client::builder()
                .timeout(Duration::from_secs(120))
                .build()
                .unwrap_or_default(),
        }
    }

    /// Override the API base URL. Useful for proxies and tests.
    pub fn with_api_url(mut self, api_url: &str) -> Self {
        self.api_url = api_url.trim_end_matches('/').to_string();
        self
    }

    /// Override the model identifier.
    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/{}:generateContent?key={}",
            self.api_url, self.model, self.api_key
        )
    }
}

#[async_trait]
impl TextModel for GeminiClient {
    async fn generate(&self, prompt: &str) -> ScrapeResult<String> {
        if !self.is_configured() {
            return Err(ScrapeError::NotConfigured("gemini api key"));
        }

        let body = json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }]
        });

        let response = self
            .client
            .post(self.endpoint())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(ScrapeError::Llm("invalid or unauthorized API key".into()));
        }
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ScrapeError::RateLimited);
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(ScrapeError::Llm(format!("{}: {}", status, detail)));
        }

        let payload: serde_json::Value = response.json().await?;

        let text = payload
            .get("candidates")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("content"))
            .and_then(|c| c.get("parts"))
            .and_then(|p| p.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.as_str())
            .ok_or(ScrapeError::MissingField(
                "candidates[0].content.parts[0].text",
            ))?;

        Ok(text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_shape() {
        let client = GeminiClient::new("secret").with_model("gemini-2.0-flash");
        assert_eq!(
            client.endpoint(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent?key=secret"
        );
    }

    #[test]
    fn test_api_url_trailing_slash_trimmed() {
        let client = GeminiClient::new("k").with_api_url("http://localhost:9999/v1/");
        assert!(client.endpoint().starts_with("http://localhost:9999/v1/gemini"));
    }

    #[test]
    fn test_unconfigured_without_key() {
        assert!(!GeminiClient::new("").is_configured());
        assert!(GeminiClient::new("k").is_configured());
    }

    #[tokio::test]
    async fn test_generate_without_key_errors() {
        let err = GeminiClient::new("").generate("hi").await.unwrap_err();
        assert!(matches!(err, ScrapeError::NotConfigured(_)));
    }
}
