//! Shared test utilities for ketoplan integration tests.
//!
//! Provides:
//! - plan fixtures ([`targets`], [`day`], [`on_target_plan`]),
//! - a scripted [`PlanRequester`] that replays canned answers,
//! - an axum stub of the chat completions endpoint for exercising the real
//!   HTTP requester without a network.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri, header};
use axum::response::IntoResponse;
use axum::routing::post;

use ketoplan_core::plan::{DayLabel, MealPlan, MealPlanDay, PLAN_DAYS};
use ketoplan_core::request::{PlanRequester, PromptContext, RequestError};
use ketoplan_core::targets::UserTargets;

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// 2200 kcal, 150 g protein, £60/week.
pub fn targets(strict_keto: bool) -> UserTargets {
    UserTargets::new(2200.0, 150.0, 60.0, strict_keto).expect("fixture targets are valid")
}

/// A day entry with every numeric field set.
pub fn day(n: u64, calories: f64, protein_g: f64, net_carbs_g: f64, cost_gbp: f64) -> MealPlanDay {
    MealPlanDay {
        day: Some(DayLabel::Index(n)),
        meals: serde_json::Value::Null,
        calories: Some(calories.into()),
        protein_g: Some(protein_g.into()),
        net_carbs_g: Some(net_carbs_g.into()),
        fat_g: None,
        cost_gbp: Some(cost_gbp.into()),
    }
}

/// A full week exactly on `targets`, 25 g net carbs a day, costing exactly
/// `total_cost` split evenly across the days.
pub fn on_target_plan(targets: &UserTargets, total_cost: f64) -> MealPlan {
    let per_day = total_cost / PLAN_DAYS as f64;
    MealPlan {
        days: (1..=PLAN_DAYS as u64)
            .map(|n| day(n, targets.daily_calories, targets.daily_protein_g, 25.0, per_day))
            .collect(),
        total_cost_gbp: Some(total_cost.into()),
        ..MealPlan::default()
    }
}

/// Model-style JSON text for `plan`.
pub fn plan_json(plan: &MealPlan) -> String {
    serde_json::to_string(plan).expect("fixture plans serialize")
}

// ---------------------------------------------------------------------------
// Scripted requester
// ---------------------------------------------------------------------------

/// A [`PlanRequester`] that returns queued answers in order and records the
/// contexts it was called with.
#[derive(Default)]
pub struct ScriptedRequester {
    answers: Mutex<VecDeque<Result<String, RequestError>>>,
    seen_models: Mutex<Vec<String>>,
}

impl ScriptedRequester {
    pub fn new(answers: impl IntoIterator<Item = Result<String, RequestError>>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            seen_models: Mutex::new(Vec::new()),
        }
    }

    /// Number of calls made so far.
    pub fn calls(&self) -> usize {
        self.seen_models.lock().expect("lock poisoned").len()
    }

    /// Model identifiers passed on each call.
    pub fn seen_models(&self) -> Vec<String> {
        self.seen_models.lock().expect("lock poisoned").clone()
    }
}

#[async_trait]
impl PlanRequester for ScriptedRequester {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn request_plan(&self, ctx: &PromptContext) -> Result<String, RequestError> {
        self.seen_models
            .lock()
            .expect("lock poisoned")
            .push(ctx.model.clone());
        self.answers
            .lock()
            .expect("lock poisoned")
            .pop_front()
            .unwrap_or_else(|| Err(RequestError::Network("scripted requester exhausted".into())))
    }
}

// ---------------------------------------------------------------------------
// HTTP stub server
// ---------------------------------------------------------------------------

/// A canned HTTP response.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
}

impl StubResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A 200 chat-completions envelope whose single choice carries `content`.
    pub fn completion(content: &str) -> Self {
        let body = serde_json::json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        });
        Self::new(200, body.to_string())
    }
}

/// One request as the stub server saw it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    /// The body parsed as JSON.
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Default)]
struct StubState {
    queue: Mutex<VecDeque<StubResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    hits: AtomicUsize,
}

/// A local chat-completions endpoint that answers each request with the next
/// queued [`StubResponse`] and records what it received.
pub struct StubServer {
    /// Base URL to pass as the provider root, e.g. `http://127.0.0.1:4321/v1`.
    pub base_url: String,
    state: Arc<StubState>,
}

impl StubServer {
    /// Bind to an ephemeral port and start serving `responses` in order.
    /// Once exhausted, every further request gets a 500.
    pub async fn start(responses: Vec<StubResponse>) -> Self {
        let state = Arc::new(StubState {
            queue: Mutex::new(VecDeque::from(responses)),
            ..StubState::default()
        });
        let app = Router::new()
            .route("/v1/chat/completions", post(chat_completions))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind stub server");
        let addr = listener.local_addr().expect("stub server has no address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("stub server failed");
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            state,
        }
    }

    /// Number of requests served.
    pub fn hits(&self) -> usize {
        self.state.hits.load(Ordering::SeqCst)
    }

    /// Every request served, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().expect("lock poisoned").clone()
    }
}

async fn chat_completions(
    State(state): State<Arc<StubState>>,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    state.hits.fetch_add(1, Ordering::SeqCst);
    state.requests.lock().expect("lock poisoned").push(RecordedRequest {
        path: uri.path().to_string(),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body,
    });

    let response = state
        .queue
        .lock()
        .expect("lock poisoned")
        .pop_front()
        .unwrap_or_else(|| StubResponse::new(500, "stub server exhausted"));
    let status =
        StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, [(header::CONTENT_TYPE, "application/json")], response.body)
}
