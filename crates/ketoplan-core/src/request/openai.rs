//! OpenAI-compatible chat completions requester.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::prompt::{ChatMessage, build_messages};
use super::retry::RetryPolicy;
use super::{PlanRequester, PromptContext, RequestError};

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Sampling temperature for plan requests. Low, so repeated runs with the
/// same inputs stay close.
const TEMPERATURE: f64 = 0.2;

pub struct OpenAiRequester {
    api_key: String,
    base_url: String,
    timeout: Duration,
    retry: RetryPolicy,
    client: Client,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAiRequester {
    /// Build a requester. Fails only if the HTTP client cannot be created.
    pub fn new(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, RequestError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RequestError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            timeout,
            retry,
            client,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    async fn send_once(&self, request: &ChatRequest<'_>, attempt: u32) -> Result<String, RequestError> {
        tracing::info!(model = request.model, attempt, "requesting meal plan");

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("plan request failed: {e}");
                if e.is_timeout() {
                    RequestError::Network(format!(
                        "request timed out after {}s",
                        self.timeout.as_secs()
                    ))
                } else {
                    RequestError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RequestError::Network(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "provider returned error");
            return Err(RequestError::from_status(status.as_u16(), &body));
        }

        extract_content(status.as_u16(), &body)
    }
}

impl fmt::Debug for OpenAiRequester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiRequester")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

/// Pull the first choice's message content out of a completion body.
fn extract_content(status: u16, body: &str) -> Result<String, RequestError> {
    let parsed: ChatResponse = serde_json::from_str(body).map_err(|e| {
        tracing::error!("failed to parse completion envelope: {e}");
        RequestError::from_status(status, body)
    })?;

    parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| RequestError::Upstream {
            status,
            body: "completion contained no message content".to_string(),
        })
}

#[async_trait]
impl PlanRequester for OpenAiRequester {
    fn name(&self) -> &str {
        "openai"
    }

    async fn request_plan(&self, ctx: &PromptContext) -> Result<String, RequestError> {
        let messages = build_messages(ctx);
        let request = ChatRequest {
            model: &ctx.model,
            messages: &messages,
            temperature: TEMPERATURE,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        self.retry
            .run(|attempt| self.send_once(&request, attempt))
            .await
    }
}
