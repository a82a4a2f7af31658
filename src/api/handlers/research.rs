use crate::{
    research::{
        ChannelStream, DataStream, MemoryStream, ResearchCoordinator, ResearchState,
        StreamMessage,
    },
    types::{AppError, ResearchRequest, ResearchResponse, Result},
    AppState,
};
use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::Stream;
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Instant;

fn prepare(
    state: &AppState,
    payload: ResearchRequest,
) -> Result<(ResearchCoordinator, ResearchState)> {
    let topic = payload.topic.trim();
    if topic.is_empty() {
        return Err(AppError::InvalidInput("Invalid topic input".to_string()));
    }

    let coordinator =
        ResearchCoordinator::new(state.steps.clone(), state.config.research.max_iterations);
    let research_state = ResearchState::new(topic).with_clarifications(payload.clarifications);

    Ok((coordinator, research_state))
}

/// Run a full research and return the report
#[utoipa::path(
    post,
    path = "/api/research",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Research completed", body = ResearchResponse),
        (status = 400, description = "Invalid input"),
        (status = 500, description = "Research aborted")
    ),
    tag = "research"
)]
pub async fn deep_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Json<ResearchResponse>> {
    let start = Instant::now();
    let (coordinator, mut research_state) = prepare(&state, payload)?;

    let stream = Arc::new(MemoryStream::new());
    let run = coordinator
        .run_streaming(&mut research_state, stream.clone())
        .await?;

    let to_json = |e: serde_json::Error| AppError::Internal(format!("Serialization failed: {}", e));
    let activities = stream
        .activities()
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(to_json)?;

    Ok(Json(ResearchResponse {
        initial_queries: serde_json::to_value(&run.initial_plan).map_err(to_json)?,
        report: run.report,
        iterations: run.iterations,
        termination: run.termination.to_string(),
        findings: research_state.findings,
        activities,
        duration_ms: start.elapsed().as_millis() as u64,
    }))
}

/// Run a research, streaming activities and the report as server-sent events
#[utoipa::path(
    post,
    path = "/api/research/stream",
    request_body = ResearchRequest,
    responses(
        (status = 200, description = "Event stream of activity, report and error messages"),
        (status = 400, description = "Invalid input")
    ),
    tag = "research"
)]
pub async fn stream_research(
    State(state): State<AppState>,
    Json(payload): Json<ResearchRequest>,
) -> Result<Sse<impl Stream<Item = std::result::Result<Event, Infallible>>>> {
    let (coordinator, mut research_state) = prepare(&state, payload)?;
    let (channel, mut rx) = ChannelStream::new();
    let stream: Arc<dyn DataStream> = Arc::new(channel);

    tokio::spawn(async move {
        if let Err(e) = coordinator
            .run_streaming(&mut research_state, stream.clone())
            .await
        {
            tracing::error!(topic = %research_state.topic(), error = %e, "Research run aborted");
            stream.write_data(StreamMessage::Error(e.to_string()));
        }
    });

    let events = async_stream::stream! {
        while let Some(message) = rx.recv().await {
            match Event::default().json_data(&message) {
                Ok(event) => yield Ok::<Event, Infallible>(event),
                Err(e) => tracing::warn!(error = %e, "Skipping unserializable stream message"),
            }
        }
    };

    Ok(Sse::new(events).keep_alive(KeepAlive::default()))
}
