//! One plan-generation session: request, parse, validate.
//!
//! A [`PlanSession`] owns every session-scoped value (targets, preferences,
//! price hints, model) and hands them to the requester and validator as
//! parameters. Nothing here is process-wide.

use thiserror::Error;

use crate::plan::{MealPlan, PlanParseError, parse_plan_json};
use crate::prices::PriceTable;
use crate::request::{PlanRequester, PromptContext, RequestError};
use crate::targets::{Preferences, UserTargets};
use crate::validate::{ValidationResult, validate_plan};

/// Why a session produced no plan.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("plan request failed: {0}")]
    Request(#[from] RequestError),

    #[error("could not parse the model's response: {source}")]
    Parse {
        source: PlanParseError,
        /// The raw text that failed to parse, for diagnostics.
        raw: String,
    },
}

impl SessionError {
    /// Short message suitable for showing to the user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request(err) => err.user_message(),
            Self::Parse { .. } => {
                "Could not understand the model's response, please retry.".to_string()
            }
        }
    }
}

/// A successfully parsed plan and its validation result. Violations do not
/// make a session fail.
#[derive(Debug, Clone)]
pub struct PlanOutcome {
    pub plan: MealPlan,
    pub result: ValidationResult,
}

/// Session-scoped inputs for plan generation.
#[derive(Debug, Clone)]
pub struct PlanSession {
    context: PromptContext,
}

impl PlanSession {
    /// Start a session with default preferences and no price hints.
    pub fn new(targets: UserTargets, model: impl Into<String>) -> Self {
        Self {
            context: PromptContext {
                targets,
                preferences: Preferences::default(),
                prices: None,
                model: model.into(),
            },
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.context.preferences = preferences;
        self
    }

    pub fn with_prices(mut self, prices: PriceTable) -> Self {
        self.context.prices = Some(prices);
        self
    }

    pub fn context(&self) -> &PromptContext {
        &self.context
    }

    pub fn targets(&self) -> &UserTargets {
        &self.context.targets
    }

    /// Run one request, parse the answer and validate it.
    pub async fn run(&self, requester: &dyn PlanRequester) -> Result<PlanOutcome, SessionError> {
        let raw = requester.request_plan(&self.context).await?;
        tracing::debug!(requester = requester.name(), bytes = raw.len(), "received model response");

        let plan = parse_plan_json(&raw).map_err(|source| {
            tracing::warn!(error = %source, "model response did not parse");
            SessionError::Parse { source, raw }
        })?;

        let result = validate_plan(&plan, &self.context.targets);
        if result.pass() {
            tracing::info!(days = plan.days.len(), "plan passed validation");
        } else {
            tracing::warn!(
                days = plan.days.len(),
                violations = result.violations.len(),
                "plan has violations"
            );
        }

        Ok(PlanOutcome { plan, result })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    struct FixedRequester(Result<String, RequestError>);

    #[async_trait]
    impl PlanRequester for FixedRequester {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn request_plan(&self, _ctx: &PromptContext) -> Result<String, RequestError> {
            self.0.clone()
        }
    }

    fn session() -> PlanSession {
        PlanSession::new(UserTargets::new(2200.0, 150.0, 60.0, true).unwrap(), "test-model")
    }

    #[tokio::test]
    async fn request_errors_pass_through() {
        let requester = FixedRequester(Err(RequestError::RateLimit));
        let err = session().run(&requester).await.unwrap_err();
        assert!(matches!(err, SessionError::Request(RequestError::RateLimit)));
        assert!(err.user_message().contains("rate limiting"));
    }

    #[tokio::test]
    async fn unparseable_response_is_parse_error() {
        let requester = FixedRequester(Ok("I can't help with that.".to_string()));
        let err = session().run(&requester).await.unwrap_err();
        match &err {
            SessionError::Parse { raw, .. } => assert_eq!(raw, "I can't help with that."),
            other => panic!("expected Parse, got {other:?}"),
        }
        assert_eq!(
            err.user_message(),
            "Could not understand the model's response, please retry."
        );
    }

    #[tokio::test]
    async fn violations_do_not_fail_the_session() {
        let requester = FixedRequester(Ok(r#"{"days": [], "total_cost_gbp": 10}"#.to_string()));
        let outcome = session().run(&requester).await.unwrap();
        assert!(!outcome.result.pass());
        assert!(outcome.plan.days.is_empty());
    }

    #[test]
    fn builder_sets_context() {
        let s = session().with_prices(PriceTable::default());
        assert_eq!(s.context().model, "test-model");
        assert!(s.context().prices.is_some());
        assert!(s.targets().strict_keto);
    }
}
