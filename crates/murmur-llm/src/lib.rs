//! Local LLM client and endpoint prober for murmur.
//!
//! Talks to an OpenAI-compatible server hosted locally. The dump path
//! posts the accumulated transcript as a chat completion; the probe path
//! health-checks a fixed set of endpoints.

mod probe;

pub use probe::{
    PROBE_INTERVAL, PROBE_TIMEOUT, ProbeEndpoint, ProbeMethod, ProbeStatus, default_endpoints,
    probe,
};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Base URL of the local LLM server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:1234/v1";

/// System instruction sent ahead of the transcript on every dump.
const EXTRACT_PROMPT: &str =
    "Extract the useful information from the transcript below. Be concise.";

/// Errors that can occur talking to the LLM server.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("API request failed: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// One chat message in the request payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Chat completion request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    /// Dump payload: the extraction instruction plus the raw transcript.
    pub fn extraction(transcript: impl Into<String>) -> Self {
        Self {
            messages: vec![
                ChatMessage::system(EXTRACT_PROMPT),
                ChatMessage::user(transcript),
            ],
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: String,
}

/// Client for the local LLM server.
#[derive(Debug, Clone)]
pub struct LlmClient {
    client: reqwest::Client,
    base_url: String,
}

impl LlmClient {
    /// Create a client against the default local server.
    pub fn new(client: reqwest::Client) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    /// Create a client against a specific base URL.
    pub fn with_base_url(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends the transcript as a chat completion and returns the content
    /// of the first choice.
    pub async fn extract(&self, transcript: String) -> Result<String> {
        let request = ChatRequest::extraction(transcript);
        debug!(base_url = %self.base_url, "Sending transcript to LLM");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&request)
            .send()
            .await?;

        if !dump_success(response.status()) {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("API returned {}: {}", status, body)));
        }

        let chat: ChatResponse = response.json().await?;
        first_choice_content(chat)
    }
}

// Exactly 200 counts as success, the same classification the prober uses.
fn dump_success(status: StatusCode) -> bool {
    status == StatusCode::OK
}

fn first_choice_content(response: ChatResponse) -> Result<String> {
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| LlmError::Api("response contained no choices".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_request_shape() {
        let request = ChatRequest::extraction("hello world\n");
        let value: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&request).unwrap()).unwrap();

        let messages = value["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "system");
        assert_eq!(messages[1]["role"], "user");
        assert_eq!(messages[1]["content"], "hello world\n");
    }

    #[test]
    fn test_first_choice_content_is_extracted() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices": [{"message": {"role": "assistant", "content": "useful info"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_choice_content(response).unwrap(), "useful info");
    }

    #[test]
    fn test_empty_choices_is_an_api_error() {
        let response: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            first_choice_content(response),
            Err(LlmError::Api(_))
        ));
    }

    #[test]
    fn test_only_200_counts_as_dump_success() {
        assert!(dump_success(StatusCode::OK));
        assert!(!dump_success(StatusCode::CREATED));
        assert!(!dump_success(StatusCode::NO_CONTENT));
        assert!(!dump_success(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = LlmClient::with_base_url(reqwest::Client::new(), "http://localhost:9999/v1/");
        assert_eq!(client.base_url(), "http://localhost:9999/v1");
    }
}
