//! Plan requester: the adapter interface for the hosted model, plus prompt
//! construction, retry policy and the OpenAI-compatible implementation.

pub mod openai;
pub mod prompt;
pub mod retry;

use async_trait::async_trait;
use thiserror::Error;

use crate::prices::PriceTable;
use crate::targets::{Preferences, UserTargets};

pub use openai::OpenAiRequester;
pub use prompt::{ChatMessage, Role, build_messages, build_system_prompt, build_user_context};
pub use retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Everything the prompt is built from, for one session.
#[derive(Debug, Clone)]
pub struct PromptContext {
    pub targets: UserTargets,
    pub preferences: Preferences,
    /// Optional supermarket price hints.
    pub prices: Option<PriceTable>,
    /// Model identifier passed to the provider (e.g. `gpt-4o-mini`).
    pub model: String,
}

/// Errors from calling the model provider.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RequestError {
    /// Connection failure, timeout, or other transport problem.
    #[error("network error: {0}")]
    Network(String),

    /// The provider rejected the API key (HTTP 401/403).
    #[error("authentication failed (HTTP {status})")]
    Auth { status: u16 },

    /// The provider is throttling us (HTTP 429).
    #[error("rate limited by the model provider (HTTP 429)")]
    RateLimit,

    /// Any other non-success response, or a success response we could not
    /// read a completion from.
    #[error("upstream error (HTTP {status}): {body}")]
    Upstream { status: u16, body: String },
}

/// Longest upstream body kept in an error, in bytes.
const MAX_BODY_SNIPPET: usize = 1024;

impl RequestError {
    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => Self::Auth { status },
            429 => Self::RateLimit,
            _ => Self::Upstream {
                status,
                body: truncate_snippet(body, MAX_BODY_SNIPPET),
            },
        }
    }

    /// The HTTP status behind this error, when there was one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network(_) => None,
            Self::Auth { status } | Self::Upstream { status, .. } => Some(*status),
            Self::RateLimit => Some(429),
        }
    }

    /// Whether a second attempt might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::RateLimit => true,
            Self::Upstream { status, .. } => *status >= 500,
            Self::Auth { .. } => false,
        }
    }

    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        let base = match self {
            Self::Network(_) => "Could not reach the model provider. Check your connection and retry.",
            Self::Auth { .. } => "The model provider rejected the API key. Check OPENAI_API_KEY.",
            Self::RateLimit => "The model provider is rate limiting requests. Wait a moment and retry.",
            Self::Upstream { .. } => "The model provider returned an error. Please retry.",
        };
        match self.status() {
            Some(status) => format!("{base} (HTTP {status})"),
            None => base.to_string(),
        }
    }
}

/// Truncate a string to at most `max_bytes` bytes, appending "..." if
/// truncated.
fn truncate_snippet(s: &str, max_bytes: usize) -> String {
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    let mut truncated = s[..end].to_owned();
    truncated.push_str("...");
    truncated
}

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Adapter interface for the hosted text-generation endpoint.
///
/// Implementors turn a [`PromptContext`] into the model's raw text answer.
/// The text is untrusted: callers must run it through
/// [`crate::plan::parse_plan_json`] before validating it.
#[async_trait]
pub trait PlanRequester: Send + Sync {
    /// Human-readable name for this requester (e.g. "openai").
    fn name(&self) -> &str;

    /// Send one plan request and return the raw completion text.
    async fn request_plan(&self, ctx: &PromptContext) -> Result<String, RequestError>;
}

// Compile-time assertion: PlanRequester must be usable as `dyn PlanRequester`.
const _: () = {
    fn _assert_object_safe(_: &dyn PlanRequester) {}
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(RequestError::from_status(401, ""), RequestError::Auth { status: 401 });
        assert_eq!(RequestError::from_status(403, ""), RequestError::Auth { status: 403 });
        assert_eq!(RequestError::from_status(429, "slow down"), RequestError::RateLimit);
        assert_eq!(
            RequestError::from_status(503, "overloaded"),
            RequestError::Upstream {
                status: 503,
                body: "overloaded".to_string()
            }
        );
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        assert!(RequestError::Network("reset".into()).is_transient());
        assert!(RequestError::RateLimit.is_transient());
        assert!(RequestError::from_status(502, "").is_transient());
        assert!(!RequestError::from_status(400, "bad request").is_transient());
        assert!(!RequestError::Auth { status: 401 }.is_transient());
    }

    #[test]
    fn user_message_includes_status_when_known() {
        let msg = RequestError::Auth { status: 401 }.user_message();
        assert!(msg.contains("API key") && msg.contains("HTTP 401"), "{msg}");

        let msg = RequestError::Network("timed out".into()).user_message();
        assert!(!msg.contains("HTTP"), "{msg}");
    }

    #[test]
    fn upstream_body_is_truncated() {
        let body = "x".repeat(5000);
        match RequestError::from_status(500, &body) {
            RequestError::Upstream { body, .. } => {
                assert_eq!(body.len(), MAX_BODY_SNIPPET + 3);
                assert!(body.ends_with("..."));
            }
            other => panic!("expected Upstream, got {other:?}"),
        }
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_snippet("££££", 3), "£...");
        assert_eq!(truncate_snippet("short", 10), "short");
    }
}
