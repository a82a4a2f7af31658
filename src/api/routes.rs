use crate::api::handlers::{clarify, research};
use crate::AppState;
use axum::{routing::post, Router};

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/clarify", post(clarify::clarify))
        .route("/research", post(research::deep_research))
        .route("/research/stream", post(research::stream_research))
}
