//! HTTP API v1 for the pipeline.
//!
//! Endpoints:
//!
//! - `POST /v1/pipeline/run`       Execute one full run
//! - `POST /v1/pipeline/plan`      Expansion plus task planning, no writes
//! - `POST /v1/route`              Preview the stage route for an intent
//! - `GET  /v1/stages`             Stage registry
//! - `GET  /v1/stages/{id}`        One stage
//! - `GET  /v1/personas`           Persona registry
//! - `GET  /v1/persona/current`    The session's persona
//! - `POST /v1/persona/select`     Make a persona current
//! - `GET  /v1/dashboard/overview` Compact dashboard read model
//! - `GET  /v1/journal/overview`   Journal counts and newest events

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

use iqraa_core::error::PipelineError;
use iqraa_core::persona::Persona;
use iqraa_core::stage::{Stage, StageId};
use iqraa_memory::{JournalOverview, MemoryStore, DEFAULT_LAST_EVENTS};
use iqraa_pipeline::{
    AsymmetricEdge, DashboardOverview, Orchestrator, PipelineResult, PlanOutcome, RoutePlan,
    RunOptions,
};

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the v1 API.
///
/// The store sits behind an async mutex: a run holds it from load to sync,
/// so runs and persona selections are serialized.
pub struct ApiV1State {
    pub store: Mutex<MemoryStore>,
    pub orchestrator: Orchestrator,
}

impl ApiV1State {
    pub fn new(store: MemoryStore, orchestrator: Orchestrator) -> Self {
        Self {
            store: Mutex::new(store),
            orchestrator,
        }
    }
}

pub type SharedApiState = Arc<ApiV1State>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the v1 API router. Nest this under "/v1" in the main router.
pub fn v1_router(state: SharedApiState) -> Router {
    Router::new()
        .route("/pipeline/run", post(run_handler))
        .route("/pipeline/plan", post(plan_handler))
        .route("/route", post(route_handler))
        .route("/stages", get(list_stages_handler))
        .route("/stages/{id}", get(get_stage_handler))
        .route("/personas", get(list_personas_handler))
        .route("/persona/current", get(current_persona_handler))
        .route("/persona/select", post(select_persona_handler))
        .route("/dashboard/overview", get(dashboard_overview_handler))
        .route("/journal/overview", get(journal_overview_handler))
        .with_state(state)
}

// ── Request / Response types ──────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn pipeline_error(e: PipelineError) -> ApiError {
    match e {
        PipelineError::UnknownPersona(id) => {
            api_error(StatusCode::BAD_REQUEST, format!("Unknown persona: '{id}'"))
        }
        other => {
            error!(error = %other, "Pipeline request failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, other.to_string())
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PipelineRequest {
    #[serde(default)]
    input: Option<String>,
    #[serde(default)]
    persona_id: Option<String>,
}

impl PipelineRequest {
    /// The non-blank input, or a 400.
    fn into_parts(self) -> Result<(String, RunOptions), ApiError> {
        match self.input {
            Some(input) if !input.trim().is_empty() => Ok((
                input,
                RunOptions {
                    persona_id: self.persona_id,
                },
            )),
            _ => Err(api_error(StatusCode::BAD_REQUEST, "'input' must be a non-empty string")),
        }
    }
}

#[derive(Deserialize)]
struct RouteRequest {
    #[serde(default)]
    intent: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StageListResponse {
    stages: &'static [Stage],
    asymmetric_edges: Vec<AsymmetricEdge>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PersonaListResponse {
    personas: &'static [Persona],
    default_persona_id: &'static str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SelectPersonaRequest {
    persona_id: String,
}

#[derive(Deserialize)]
struct JournalQuery {
    last: Option<usize>,
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn run_handler(
    State(state): State<SharedApiState>,
    Json(req): Json<PipelineRequest>,
) -> ApiResult<PipelineResult> {
    let (input, options) = req.into_parts()?;
    info!(input_chars = input.chars().count(), "Pipeline run requested");

    let mut store = state.store.lock().await;
    state
        .orchestrator
        .run(&mut store, &input, options)
        .await
        .map(Json)
        .map_err(pipeline_error)
}

async fn plan_handler(
    State(state): State<SharedApiState>,
    Json(req): Json<PipelineRequest>,
) -> ApiResult<PlanOutcome> {
    let (input, options) = req.into_parts()?;

    let mut store = state.store.lock().await;
    state
        .orchestrator
        .plan(&mut store, &input, options)
        .await
        .map(Json)
        .map_err(pipeline_error)
}

async fn route_handler(Json(req): Json<RouteRequest>) -> Json<RoutePlan> {
    Json(iqraa_pipeline::route_plan(&req.intent))
}

async fn list_stages_handler() -> Json<StageListResponse> {
    Json(StageListResponse {
        stages: iqraa_pipeline::list_stages(),
        asymmetric_edges: iqraa_pipeline::asymmetric_edges(),
    })
}

async fn get_stage_handler(Path(id): Path<u8>) -> ApiResult<&'static Stage> {
    iqraa_pipeline::get_stage(StageId(id))
        .map(Json)
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, format!("Unknown stage: {id}")))
}

async fn list_personas_handler() -> Json<PersonaListResponse> {
    Json(PersonaListResponse {
        personas: iqraa_pipeline::list_personas(),
        default_persona_id: iqraa_pipeline::DEFAULT_PERSONA_ID,
    })
}

async fn current_persona_handler(State(state): State<SharedApiState>) -> Json<&'static Persona> {
    let store = state.store.lock().await;
    Json(state.orchestrator.current_persona(&store))
}

async fn select_persona_handler(
    State(state): State<SharedApiState>,
    Json(req): Json<SelectPersonaRequest>,
) -> ApiResult<&'static Persona> {
    let mut store = state.store.lock().await;
    state
        .orchestrator
        .select_persona(&mut store, &req.persona_id)
        .await
        .map(Json)
        .map_err(pipeline_error)
}

async fn dashboard_overview_handler(State(state): State<SharedApiState>) -> Json<DashboardOverview> {
    let store = state.store.lock().await;
    Json(state.orchestrator.overview(&store))
}

async fn journal_overview_handler(
    State(state): State<SharedApiState>,
    Query(query): Query<JournalQuery>,
) -> ApiResult<JournalOverview> {
    let store = state.store.lock().await;
    store
        .journal()
        .overview(query.last.unwrap_or(DEFAULT_LAST_EVENTS))
        .map(Json)
        .map_err(|e| {
            error!(error = %e, "Journal read failed");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        })
}
