/// LLM Client: the single point of entry for all chat-completion calls.
///
/// No other module may call OpenRouter directly. Handlers and the batch
/// orchestrator depend on the `CompletionClient` trait so they can run against
/// a scripted client in tests.
///
/// Model: openai/gpt-oss-20b:free (hardcoded to keep scoring comparable across batches)
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";
const HTTP_REFERER: &str = "http://localhost:3000";
const APP_TITLE: &str = "Resume JD Evaluator";
/// The model used for every analysis.
pub const MODEL: &str = "openai/gpt-oss-20b:free";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned no usable message")]
    EmptyContent,
}

/// Text returned by one chat completion.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    /// Model name reported by the upstream, or the requested id if it omitted one.
    pub model: String,
    pub content: String,
}

/// Anything that can turn a prompt into completion text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
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
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<ResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl ChatResponse {
    /// Content of the first choice, if it carries a non-empty message.
    fn into_completion(self) -> Result<Completion, LlmError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;

        Ok(Completion {
            model: self.model.unwrap_or_else(|| MODEL.to_string()),
            content,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OpenRouterError {
    error: OpenRouterErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenRouterErrorBody {
    message: String,
}

/// Maps a non-2xx reply to `LlmError::Api`, preferring the upstream's own message.
fn api_error(status: StatusCode, body: String) -> LlmError {
    let message = match serde_json::from_str::<OpenRouterError>(&body) {
        Ok(parsed) => parsed.error.message,
        Err(_) if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string(),
        Err(_) => body,
    };
    LlmError::Api {
        status: status.as_u16(),
        message,
    }
}

/// OpenRouter chat-completion client. One request per call, no retry.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
}

impl LlmClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            api_key,
        })
    }
}

#[async_trait]
impl CompletionClient for LlmClient {
    async fn complete(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        debug!("Sending prompt to {MODEL} ({} chars)", prompt.len());

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", HTTP_REFERER)
            .header("X-Title", APP_TITLE)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(api_error(status, body));
        }

        let completion = response.json::<ChatResponse>().await?.into_completion()?;
        debug!(
            "LLM call succeeded: model={}, content_chars={}",
            completion.model,
            completion.content.len()
        );
        Ok(completion)
    }
}
