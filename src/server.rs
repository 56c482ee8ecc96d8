//! HTTP surface: the embedded chat page, the ask endpoint and session
//! management routes. Handlers stay thin; everything interesting happens
//! in the resolver.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::history::{is_valid_session_id, ChatTurn, SessionInfo};
use crate::resolver::Resolver;

pub struct AppState {
    pub resolver: Resolver,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/ask", post(ask))
        .route("/sessions", get(list_sessions).post(create_session))
        .route(
            "/sessions/{session_id}",
            get(session_history).delete(delete_session),
        )
        .with_state(state)
}

async fn home() -> Html<&'static str> {
    Html(include_str!("../assets/chat.html"))
}

async fn health() -> &'static str {
    "OK"
}

fn new_session_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub answer: String,
    pub session_id: String,
}

/// Answer one query. A missing or malformed session id silently becomes a
/// fresh one; the id in the response is what the client should send next.
async fn ask(State(state): State<Arc<AppState>>, Json(req): Json<AskRequest>) -> Json<AskResponse> {
    let session_id = req
        .session_id
        .filter(|id| is_valid_session_id(id))
        .unwrap_or_else(new_session_id);
    let answer = state.resolver.answer(&session_id, &req.query).await;
    Json(AskResponse { answer, session_id })
}

#[derive(Debug, Serialize)]
struct SessionCreated {
    session_id: String,
}

async fn create_session() -> (StatusCode, Json<SessionCreated>) {
    let session_id = new_session_id();
    info!(session_id = %session_id, "issued new session");
    (StatusCode::CREATED, Json(SessionCreated { session_id }))
}

async fn list_sessions(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<SessionInfo>>, StatusCode> {
    state.resolver.store().list_sessions().map(Json).map_err(|e| {
        error!(error = %e, "failed to list sessions");
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

async fn session_history(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> Result<Json<Vec<ChatTurn>>, StatusCode> {
    if !is_valid_session_id(&session_id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let store = state.resolver.store();
    match store.session_info(&session_id) {
        Ok(Some(_)) => store.load(&session_id).map(Json).map_err(|e| {
            error!(session_id = %session_id, error = %e, "failed to load session history");
            StatusCode::INTERNAL_SERVER_ERROR
        }),
        Ok(None) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to read session");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Delete a session's log and its remembered topic.
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<String>,
) -> StatusCode {
    if !is_valid_session_id(&session_id) {
        return StatusCode::NOT_FOUND;
    }
    state.resolver.context().clear(&session_id);
    match state.resolver.store().delete_session(&session_id) {
        Ok(true) => StatusCode::NO_CONTENT,
        Ok(false) => StatusCode::NOT_FOUND,
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to delete session");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
