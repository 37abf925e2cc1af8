use super::state::AppState;
use crate::session::{ConversationMessage, SupervisorState};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: String) -> Response {
    (status, Json(ErrorResponse { error })).into_response()
}

fn state_response(result: anyhow::Result<SupervisorState>) -> Response {
    match result {
        Ok(state) => (StatusCode::OK, Json(state)).into_response(),
        Err(e) => {
            error!("Supervisor request failed: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /listen/start
/// Start listening; refused when the host has no recognizer
pub async fn start_listening(State(state): State<AppState>) -> impl IntoResponse {
    if !state.supervisor.has_support() {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "Speech recognition is not supported".to_string(),
        );
    }

    info!("Start listening requested");
    state_response(state.supervisor.start().await)
}

/// POST /listen/stop
pub async fn stop_listening(State(state): State<AppState>) -> impl IntoResponse {
    info!("Stop listening requested");
    state_response(state.supervisor.stop().await)
}

/// POST /listen/enabled
pub async fn set_enabled(
    State(state): State<AppState>,
    Json(req): Json<SetEnabledRequest>,
) -> impl IntoResponse {
    state_response(state.supervisor.set_enabled(req.enabled).await)
}

/// GET /state
pub async fn get_state(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.supervisor.state()))
}

/// GET /messages
/// Conversation log (accumulated so far)
pub async fn get_messages(State(state): State<AppState>) -> impl IntoResponse {
    match state.supervisor.snapshot().await {
        Ok(snapshot) => {
            let messages: Vec<ConversationMessage> = snapshot.messages;
            (StatusCode::OK, Json(messages)).into_response()
        }
        Err(e) => {
            error!("Failed to get messages: {:#}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
