/// LLM Client: the single point of entry for chat-completion calls.
///
/// Speaks the OpenAI-compatible chat-completions protocol (Hugging Face router by
/// default). A non-2xx status is not an error at this layer: the caller receives the
/// status and raw body and decides what a failed generation means for its batch.
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;

pub const DEFAULT_API_URL: &str = "https://router.huggingface.co/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "deepseek-ai/DeepSeek-V3.1:fireworks-ai";
const REQUEST_TIMEOUT_SECS: u64 = 120;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("LLM returned empty content")]
    EmptyContent,
}

/// Status code and body of one completion call.
///
/// On success `body` is the model's message text; otherwise it is the raw error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub status: u16,
    pub body: String,
}

impl Completion {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Anything that can turn a prompt into a completion.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(api_url: String, api_key: String, model: String) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::ClientBuild(format!("LLM HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_url,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request_body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: JSON_ONLY_SYSTEM,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!("LLM API returned {}: {}", status, body);
            return Ok(Completion {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Completion {
            status: status.as_u16(),
            body: completion_text(&body)?,
        })
    }
}

/// Pulls `choices[0].message.content` out of a chat-completions response body.
fn completion_text(body: &str) -> Result<String, LlmError> {
    let response: ChatResponse = serde_json::from_str(body)?;

    if let Some(usage) = &response.usage {
        debug!(
            "LLM call succeeded: prompt_tokens={}, completion_tokens={}",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message)
        .and_then(|m| m.content)
        .filter(|text| !text.trim().is_empty())
        .ok_or(LlmError::EmptyContent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> LlmClient {
        LlmClient::new(
            format!("{}/v1/chat/completions", server.uri()),
            "hf_test_token".to_string(),
            "test-model".to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_completion_text_reads_first_choice() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"subject\": \"Hi\"}"}}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40}
        }"#;
        assert_eq!(completion_text(body).unwrap(), r#"{"subject": "Hi"}"#);
    }

    #[test]
    fn test_completion_text_without_choices_is_empty_content() {
        let err = completion_text(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_completion_text_with_null_content_is_empty_content() {
        let err = completion_text(r#"{"choices": [{"message": {"content": null}}]}"#).unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }

    #[test]
    fn test_completion_text_rejects_non_json_envelope() {
        let err = completion_text("<html>bad gateway</html>").unwrap_err();
        assert!(matches!(err, LlmError::Parse(_)));
    }

    #[tokio::test]
    async fn test_complete_sends_bearer_and_model() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("authorization", "Bearer hf_test_token"))
            .and(body_partial_json(serde_json::json!({"model": "test-model"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"content": "{\"message\": \"hello\"}"}}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let completion = client_for(&server).complete("write an email").await.unwrap();
        assert!(completion.is_success());
        assert_eq!(completion.body, r#"{"message": "hello"}"#);
    }

    #[tokio::test]
    async fn test_complete_passes_through_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("model overloaded"))
            .mount(&server)
            .await;

        let completion = client_for(&server).complete("prompt").await.unwrap();
        assert!(!completion.is_success());
        assert_eq!(completion.status, 503);
        assert_eq!(completion.body, "model overloaded");
    }
}
