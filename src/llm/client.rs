//! Async HTTP client for the chat-completion endpoint
//!
//! OpenAI-compatible wire format: `{model, messages:[{role:"user",
//! content}]}` over HTTPS with a bearer token, response text read from
//! `choices[0].message.content`. Failures are classified, not collapsed, so
//! the broker can emit distinguishable sentinels.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::llm::sentinel;

/// A failed completion call, classified for sentinel mapping
#[derive(Debug)]
pub enum CallFailure {
    /// Non-success HTTP status
    Http(u16),
    /// Transport failure before any status arrived
    Network(String),
    /// Response JSON missing the named part (`choices`, `message`, `content`)
    Malformed(&'static str),
    /// Bounded timeout elapsed
    Timeout,
}

impl CallFailure {
    /// The sentinel string the broker hands to callers for this failure
    pub fn to_sentinel(&self) -> String {
        match self {
            CallFailure::Http(status) => sentinel::http_status(*status),
            CallFailure::Network(_) => sentinel::NETWORK.to_string(),
            CallFailure::Malformed(part) => sentinel::malformed(part),
            CallFailure::Timeout => sentinel::TIMEOUT.to_string(),
        }
    }
}

/// Chat-completion client used by the broker worker
pub struct LlmClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_key: String, api_url: String, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            api_url,
            model,
        }
    }

    /// Create a client from environment variables.
    ///
    /// Required: LLM_API_KEY
    /// Optional: LLM_API_URL (defaults to the OpenAI chat endpoint)
    /// Optional: LLM_MODEL
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("LLM_API_KEY").ok()?;
        let api_url = std::env::var("LLM_API_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1/chat/completions".into());
        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self::new(api_key, api_url, model))
    }

    /// Send one completion request with a bounded timeout
    pub async fn complete(
        &self,
        prompt: &str,
        timeout: Duration,
    ) -> Result<String, CallFailure> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![Message {
                role: "user".into(),
                content: prompt.into(),
            }],
        };

        let send = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&request)
            .send();

        let response = match tokio::time::timeout(timeout, send).await {
            Err(_) => return Err(CallFailure::Timeout),
            Ok(Err(e)) if e.is_timeout() => return Err(CallFailure::Timeout),
            Ok(Err(e)) => return Err(CallFailure::Network(e.to_string())),
            Ok(Ok(response)) => response,
        };

        let status = response.status();
        if !status.is_success() {
            return Err(CallFailure::Http(status.as_u16()));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|_| CallFailure::Malformed("body"))?;
        extract_content(&body)
    }
}

/// Pull `choices[0].message.content` out of a completion body, naming the
/// first missing part on failure
fn extract_content(body: &serde_json::Value) -> Result<String, CallFailure> {
    let choices = body
        .get("choices")
        .and_then(|c| c.as_array())
        .ok_or(CallFailure::Malformed("choices"))?;
    let first = choices.first().ok_or(CallFailure::Malformed("choices"))?;
    let message = first
        .get("message")
        .ok_or(CallFailure::Malformed("message"))?;
    let content = message
        .get("content")
        .and_then(|c| c.as_str())
        .ok_or(CallFailure::Malformed("content"))?;
    Ok(content.to_string())
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_content_happy_path() {
        let body = json!({
            "choices": [{"message": {"role": "assistant", "content": "MOVE N"}}]
        });
        assert_eq!(extract_content(&body).unwrap(), "MOVE N");
    }

    #[test]
    fn test_extract_content_missing_shapes() {
        let missing_choices = json!({"id": "x"});
        assert!(matches!(
            extract_content(&missing_choices),
            Err(CallFailure::Malformed("choices"))
        ));

        let empty_choices = json!({"choices": []});
        assert!(matches!(
            extract_content(&empty_choices),
            Err(CallFailure::Malformed("choices"))
        ));

        let missing_message = json!({"choices": [{"index": 0}]});
        assert!(matches!(
            extract_content(&missing_message),
            Err(CallFailure::Malformed("message"))
        ));

        let missing_content = json!({"choices": [{"message": {"role": "assistant"}}]});
        assert!(matches!(
            extract_content(&missing_content),
            Err(CallFailure::Malformed("content"))
        ));
    }

    #[test]
    fn test_failure_sentinels_distinct() {
        assert_ne!(
            CallFailure::Http(429).to_sentinel(),
            CallFailure::Http(503).to_sentinel()
        );
        assert_ne!(
            CallFailure::Malformed("choices").to_sentinel(),
            CallFailure::Timeout.to_sentinel()
        );
    }

    #[test]
    fn test_wire_request_shape() {
        let request = ChatRequest {
            model: "test-model".into(),
            messages: vec![Message {
                role: "user".into(),
                content: "hello".into(),
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hello");
    }
}
