//! `POST /sessions`, `GET /sessions/:id/stream`, and the `/history`/`/models`
//! surface that delegates to the Persistence Gateway.
//!
//! No request validation beyond what's needed to construct a session —
//! validating arbitrary client input is explicitly out of scope.

use crate::error::ApiError;
use crate::state::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use futures::{Stream, StreamExt};
use reagent_core::SessionKey;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::convert::Infallible;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id/stream", get(stream_session))
        .route("/history", get(list_history))
        .route("/history/:id", get(get_history).delete(delete_history))
        .route("/history/:id/stream", get(stream_history))
        .route("/models", get(list_models))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any))
        .with_state(state)
}

#[derive(Deserialize)]
struct CreateSessionRequest {
    query: String,
    model: Option<String>,
    /// Accepted for wire compatibility; the engine has no concrete LLM-vendor
    /// reasoning-effort knob to bind this to (see DESIGN.md).
    #[allow(dead_code)]
    thinking_level: Option<String>,
    context: Option<String>,
}

#[derive(Serialize)]
struct CreateSessionResponse {
    session_id: String,
}

async fn create_session(
    State(state): State<AppState>,
    Json(body): Json<CreateSessionRequest>,
) -> impl IntoResponse {
    let (engine, model) = state.engine_for(body.model.as_deref());
    let solve_context = state.solve_context(body.context);

    let session = state.manager.create_session(body.query.clone(), model);
    let session_id = session.session_id.clone();
    info!(session = %session_id, model = %session.model, "session created");

    tokio::spawn(reagent_engine::session::runner::run(
        session_id.clone(),
        body.query,
        engine,
        solve_context,
        state.manager.clone(),
        state.repository.clone(),
    ));

    Json(CreateSessionResponse {
        session_id: session_id.as_str().to_string(),
    })
}

async fn stream_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let session_id = SessionKey::new(id.clone());
    if state.manager.get_session(&session_id).is_none() {
        return Err(ApiError(StatusCode::NOT_FOUND, format!("session '{id}' not found")));
    }

    let stream = state
        .manager
        .subscribe(&session_id)
        .map(|event| Ok(to_sse_event(&event)));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: &reagent_core::Event) -> SseEvent {
    let kind = serde_json::to_value(event.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "event".to_string());
    SseEvent::default()
        .event(kind)
        .json_data(event)
        .unwrap_or_else(|_| SseEvent::default().data("{}"))
}

#[derive(Deserialize)]
struct ListQuery {
    #[serde(default = "default_limit")]
    limit: usize,
    #[serde(default)]
    offset: usize,
    q: Option<String>,
}

fn default_limit() -> usize {
    50
}

async fn list_history(State(state): State<AppState>, Query(q): Query<ListQuery>) -> Result<impl IntoResponse, ApiError> {
    let records = match &q.q {
        Some(needle) => state.repository.search(needle).await?,
        None => state.repository.list(q.limit, q.offset).await?,
    };
    Ok(Json(records))
}

async fn get_history(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    match state.repository.get(&id).await? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError(StatusCode::NOT_FOUND, format!("session '{id}' not found"))),
    }
}

async fn delete_history(State(state): State<AppState>, Path(id): Path<String>) -> Result<impl IntoResponse, ApiError> {
    let deleted = state.repository.delete(&id).await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// Replays a persisted record's events as a finite SSE stream (as opposed to
/// `GET /sessions/:id/stream`, which tails a live run).
async fn stream_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<SseEvent, Infallible>>>, ApiError> {
    let record = state
        .repository
        .get(&id)
        .await?
        .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, format!("session '{id}' not found")))?;

    let events = Arc::new(record.events);
    let stream = futures::stream::iter((0..events.len()).collect::<Vec<_>>()).map(move |i| Ok(to_sse_event(&events[i])));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

async fn list_models(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({
        "models": state.config.supported_models,
        "default": state.config.agent_model,
    }))
}
