use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AppError, Result};

use super::TextOracle;

/// HTTP-backed oracle. Posts `{model, prompt, max_tokens}` to the configured
/// endpoint and expects a JSON reply with a `text` field. Single request, no
/// retry; the caller handles degradation.
pub struct HttpOracle {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    model: String,
}

impl HttpOracle {
    pub fn new(
        url: String,
        api_key: Option<String>,
        model: String,
        timeout_secs: u64,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { client, url, api_key, model })
    }
}

#[async_trait]
impl TextOracle for HttpOracle {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": 512,
        });

        let mut request = self.client.post(&self.url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?.error_for_status()?;
        let reply: serde_json::Value = response.json().await?;

        reply
            .get("text")
            .and_then(|t| t.as_str())
            .map(str::to_string)
            .ok_or_else(|| AppError::Oracle("reply missing text field".to_string()))
    }
}
