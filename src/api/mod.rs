//! HTTP API Handlers and Routes
//!
//! The REST layer for deepdive, built on the Axum web framework.
//!
//! # API Endpoints
//!
//! - `POST /api/clarify` - Generate 2-4 clarifying questions for a topic
//! - `POST /api/research` - Run a research to completion and return the report
//! - `POST /api/research/stream` - Same run, streamed as server-sent events
//! - `GET /health` - Health check
//! - `GET /api-docs/openapi.json` - OpenAPI document
//!
//! Errors are returned as `{"success": false, "error": "..."}` with status
//! 400 for invalid input and 500 otherwise.

/// Request and response handlers for all API endpoints.
pub mod handlers;
/// Router configuration and route definitions.
pub mod routes;

use crate::types::{
    Clarification, ClarifyRequest, ClarifyResponse, Finding, ResearchRequest, ResearchResponse,
};
use crate::AppState;
use axum::{routing::get, Json, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::clarify::clarify,
        handlers::research::deep_research,
        handlers::research::stream_research,
        handlers::health::health,
    ),
    components(schemas(
        ClarifyRequest,
        ClarifyResponse,
        ResearchRequest,
        ResearchResponse,
        Clarification,
        Finding,
        handlers::health::HealthResponse,
    )),
    tags(
        (name = "research", description = "Iterative web research"),
        (name = "health", description = "Liveness")
    ),
    info(title = "deepdive", description = "Iterative deep research server")
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Assemble the full application router.
pub fn build_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", routes::create_router())
        .route("/health", get(handlers::health::health))
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
