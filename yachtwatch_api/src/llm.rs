//! Optional generative-model fallback client.
//!
//! Sends a bounded prompt to a messages-style completion API and returns the
//! raw text of the first content block. The caller is responsible for pulling
//! a JSON object out of the prose; this client makes no format guarantees.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;

use crate::Error;

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(15);
const MODEL: &str = "claude-haiku-4-5-20251001";
const MAX_TOKENS: u32 = 300;

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}

/// Messages-API completion client, gated on an API key.
pub struct LlmClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String) -> Result<Self, Error> {
        Self::with_base_url("https://api.anthropic.com", api_key)
    }

    /// Creates a client against a custom host. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str, api_key: String) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .timeout(COMPLETION_TIMEOUT)
            .build()
            .map_err(|e| {
                tracing::error!("failed to build HTTP client: {}", e);
                Error::RequestFailed
            })?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            http,
        })
    }

    /// Sends a single-user-message prompt and returns the response text.
    pub async fn complete(&self, prompt: &str) -> Result<String, Error> {
        let body = json!({
            "model": MODEL,
            "max_tokens": MAX_TOKENS,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let resp = self
            .http
            .post(format!("{}/v1/messages", self.base_url))
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                tracing::debug!("completion request failed: {}", e);
                Error::RequestFailed
            })?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| {
            tracing::debug!("failed to read completion body: {}", e);
            Error::RequestFailed
        })?;

        if !status.is_success() {
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let parsed: MessagesResponse =
            serde_json::from_str(&text).map_err(|e| Error::BadResponse(e.to_string()))?;
        parsed
            .content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| Error::BadResponse("no text content block".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_response_parses() {
        let raw = r#"{"id":"msg_1","content":[{"type":"text","text":"{\"builder\":\"Oceanco\"}"}],"model":"m"}"#;
        let resp: MessagesResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(
            resp.content[0].text.as_deref(),
            Some("{\"builder\":\"Oceanco\"}")
        );
    }
}
