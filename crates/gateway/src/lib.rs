//! HTTP API gateway for Iqraa.
//!
//! Exposes the pipeline, the registries, persona selection and the
//! dashboard/journal read models as JSON over HTTP.
//!
//! Built on Axum.

pub mod api_v1;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{Router, response::Json, routing::get};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

use iqraa_pipeline::Orchestrator;

/// Origin of the dashboard development server.
const DASHBOARD_ORIGIN: &str = "http://localhost:5173";

/// Build the full router: `/health` plus the v1 API under `/v1`.
///
/// Layers applied:
/// - CORS for the dashboard origin
/// - Request body size limit (1 MB)
/// - HTTP trace logging
pub fn build_router(state: api_v1::SharedApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static(DASHBOARD_ORIGIN))
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/v1", api_v1::v1_router(state))
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Start the gateway HTTP server.
///
/// Builds the generator and the file-backed store once, loads the
/// documents, and serves until the process exits.
pub async fn start(config: iqraa_config::AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);

    let generator = iqraa_providers::build_from_config(&config)?;
    let orchestrator =
        Orchestrator::new(generator).with_default_persona(config.pipeline.default_persona.clone());

    let mut store = iqraa_memory::build_from_config(&config.memory);
    store.load_all().await?;

    let state = Arc::new(api_v1::ApiV1State::new(store, orchestrator));
    let app = build_router(state);

    info!(addr = %addr, memory_dir = %config.memory.dir.display(), "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use iqraa_memory::{ChangeJournal, InMemoryDocumentStore, InMemoryJournalSink, MemoryStore};
    use iqraa_providers::MockGenerator;
    use tower::ServiceExt;

    fn test_state() -> api_v1::SharedApiState {
        let store = MemoryStore::new(
            Arc::new(InMemoryDocumentStore::new()),
            Arc::new(ChangeJournal::new(Arc::new(InMemoryJournalSink::new()))),
        );
        let orchestrator = Orchestrator::new(Arc::new(MockGenerator::new()));
        Arc::new(api_v1::ApiV1State::new(store, orchestrator))
    }

    #[tokio::test]
    async fn health_endpoint() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn v1_is_nested() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/v1/stages/1")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let app = build_router(test_state());

        let req = Request::builder()
            .uri("/v2/anything")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
