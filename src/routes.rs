// Route Dispatcher - HTTP to service binding
//
// Each handler calls exactly one service operation and maps its failure to a
// status code plus `{"error": ...}`. No partial responses are sent.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::error;

use crate::agent::NarrativeAgent;
use crate::bulletin::load_bulletin;
use crate::entities::{CurrentVisa, StageInput, TimelineStage, VisaRecord, VisaUpdate};
use crate::error::AppError;
use crate::store::VisaStore;
use crate::timeline::TimelineService;

/// Shared application state, constructed once at startup
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<VisaStore>,
    pub timeline: Arc<TimelineService>,
    pub agent: NarrativeAgent,
    pub bulletin_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(
        store: VisaStore,
        timeline: TimelineService,
        agent: NarrativeAgent,
        bulletin_path: PathBuf,
    ) -> Self {
        AppState {
            store: Arc::new(store),
            timeline: Arc::new(timeline),
            agent,
            bulletin_path: Arc::new(bulletin_path),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A service failure plus the generic message for the route it happened on
pub struct ApiError {
    source: AppError,
    generic: &'static str,
}

impl ApiError {
    fn on(generic: &'static str) -> impl FnOnce(AppError) -> ApiError {
        move |source| ApiError { source, generic }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.source.status_code();
        let message = match &self.source {
            AppError::Storage { .. } => self.generic.to_string(),
            AppError::NotFound(_) => "Stage not found".to_string(),
            other => other.to_string(),
        };

        error!(status = status.as_u16(), "{}: {}", self.generic, self.source);
        (status, Json(ErrorBody { error: message })).into_response()
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

// ============================================================================
// Request / Response bodies
// ============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpdateResponse {
    message: &'static str,
    current_visa: CurrentVisa,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineResponse<'a> {
    stages: &'a [TimelineStage],
    total_days: u64,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StageRequest {
    #[serde(default)]
    current_stage: Option<StageInput>,
}

impl StageRequest {
    /// Empty body means "use the default stage"
    fn parse(body: &[u8]) -> Result<StageInput, AppError> {
        let request = if body.iter().all(u8::is_ascii_whitespace) {
            StageRequest::default()
        } else {
            serde_json::from_slice::<StageRequest>(body)
                .map_err(|e| AppError::validation(format!("Invalid request body: {e}")))?
        };

        Ok(request
            .current_stage
            .unwrap_or_else(StageInput::default_current))
    }
}

#[derive(Serialize)]
struct ExplainResponse {
    explanation: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NextStepsResponse {
    next_steps: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /health
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /visa
async fn get_visa(State(state): State<AppState>) -> Result<Json<VisaRecord>, ApiError> {
    state
        .store
        .read()
        .map(Json)
        .map_err(ApiError::on("Failed to retrieve visa information"))
}

/// GET /visa-bulletin
async fn get_visa_bulletin(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    load_bulletin(&state.bulletin_path)
        .map(Json)
        .map_err(ApiError::on("Failed to retrieve visa bulletin data"))
}

/// PUT /visa - status is derived here, never taken from the client
async fn update_visa(
    State(state): State<AppState>,
    payload: Result<Json<VisaUpdate>, JsonRejection>,
) -> Result<Json<UpdateResponse>, ApiError> {
    const GENERIC: &str = "Failed to update visa information";

    let Json(update) = payload.map_err(|e| {
        ApiError::on(GENERIC)(AppError::validation(format!(
            "Invalid request body: {}",
            e.body_text()
        )))
    })?;

    if !update.missing_dates().is_empty() {
        return Err(ApiError::on(GENERIC)(AppError::validation(
            "Both startDate and expirationDate are required",
        )));
    }

    let record = state
        .store
        .update(update, Utc::now())
        .map_err(ApiError::on(GENERIC))?;

    Ok(Json(UpdateResponse {
        message: "Visa information updated successfully",
        current_visa: record.current_visa,
    }))
}

/// GET /timeline
async fn get_timeline(State(state): State<AppState>) -> Response {
    let timeline = &state.timeline;

    Json(TimelineResponse {
        stages: timeline.list_stages(),
        total_days: timeline.total_expected_duration(),
    })
    .into_response()
}

/// GET /timeline/stage/:stageName
async fn get_stage(
    State(state): State<AppState>,
    Path(stage_name): Path<String>,
) -> Result<Json<TimelineStage>, ApiError> {
    state
        .timeline
        .get_stage(&stage_name)
        .cloned()
        .map(Json)
        .ok_or(AppError::NotFound(stage_name))
        .map_err(ApiError::on("Failed to retrieve stage information"))
}

/// POST /explain
async fn explain(State(state): State<AppState>, body: Bytes) -> Result<Json<ExplainResponse>, ApiError> {
    const GENERIC: &str = "Failed to generate explanation";

    if !state.agent.is_available() {
        return Err(ApiError::on(GENERIC)(AppError::UpstreamUnavailable));
    }

    let stage = StageRequest::parse(&body).map_err(ApiError::on(GENERIC))?;
    let record = state.store.read().map_err(ApiError::on(GENERIC))?;

    let explanation = state
        .agent
        .explain(&record.current_visa, &stage)
        .await
        .map_err(ApiError::on(GENERIC))?;

    Ok(Json(ExplainResponse { explanation }))
}

/// POST /next-steps
async fn next_steps(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<NextStepsResponse>, ApiError> {
    const GENERIC: &str = "Failed to generate next steps";

    if !state.agent.is_available() {
        return Err(ApiError::on(GENERIC)(AppError::UpstreamUnavailable));
    }

    let stage = StageRequest::parse(&body).map_err(ApiError::on(GENERIC))?;
    let record = state.store.read().map_err(ApiError::on(GENERIC))?;

    let next_steps = state
        .agent
        .next_steps(&stage, &record.next_stages)
        .await
        .map_err(ApiError::on(GENERIC))?;

    Ok(Json(NextStepsResponse { next_steps }))
}

// ============================================================================
// Router
// ============================================================================

/// API routes, plus static files from `public_dir` for anything else.
/// Every response carries no-cache headers.
pub fn router(state: AppState, public_dir: Option<&std::path::Path>) -> Router {
    let mut app = Router::new()
        .route("/health", get(health_check))
        .route("/visa", get(get_visa).put(update_visa))
        .route("/visa-bulletin", get(get_visa_bulletin))
        .route("/timeline", get(get_timeline))
        .route("/timeline/stage/:stageName", get(get_stage))
        .route("/explain", post(explain))
        .route("/next-steps", post(next_steps))
        .with_state(state);

    if let Some(dir) = public_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app.layer(SetResponseHeaderLayer::overriding(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::PRAGMA,
        HeaderValue::from_static("no-cache"),
    ))
    .layer(SetResponseHeaderLayer::overriding(
        header::EXPIRES,
        HeaderValue::from_static("0"),
    ))
    .layer(CorsLayer::permissive())
}
