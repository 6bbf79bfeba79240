use super::state::AppState;
use crate::session::RecordingMode;
use crate::store::CallRecording;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct StartRecordingRequest {
    /// Recording mode; defaults to the session's current default mode
    pub mode: Option<RecordingMode>,

    /// Phone number for call recordings, if known
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct StopRecordingRequest {
    /// Whether to persist a finished call session (default: true)
    pub persist: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SwitchModeRequest {
    pub mode: RecordingMode,
}

#[derive(Debug, Serialize)]
pub struct StatusMessage {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /recording/start
/// Start a recording session
pub async fn start_recording(
    State(state): State<AppState>,
    Json(req): Json<StartRecordingRequest>,
) -> impl IntoResponse {
    let mode = req.mode.unwrap_or_else(|| state.session.snapshot().mode);

    info!("Start requested over HTTP ({:?})", mode);

    match state.session.start(mode, req.phone_number).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusMessage {
                status: "recording".to_string(),
                message: format!("Recording started in {:?} mode", mode),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to start recording: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to start recording: {:#}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /recording/stop
/// Stop the active session; a no-op when idle
pub async fn stop_recording(
    State(state): State<AppState>,
    Json(req): Json<StopRecordingRequest>,
) -> impl IntoResponse {
    let persist = req.persist.unwrap_or(true);

    match state.session.stop(persist).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusMessage {
                status: "stopped".to_string(),
                message: "Recording stopped".to_string(),
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Failed to stop recording: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Failed to stop recording: {:#}", e),
                }),
            )
                .into_response()
        }
    }
}

/// POST /recording/mode
/// Change the default mode for the next recording
pub async fn switch_mode(
    State(state): State<AppState>,
    Json(req): Json<SwitchModeRequest>,
) -> impl IntoResponse {
    match state.session.switch_mode(req.mode).await {
        Ok(()) => (
            StatusCode::OK,
            Json(StatusMessage {
                status: "ok".to_string(),
                message: format!("Default mode set to {:?}", req.mode),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to switch mode: {:#}", e),
            }),
        )
            .into_response(),
    }
}

/// GET /recording/status
/// Current session snapshot
pub async fn get_status(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.session.snapshot())).into_response()
}

/// GET /recordings
/// Persisted call recordings
pub async fn list_recordings(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(e) = state.session.refresh_recordings().await {
        error!("Failed to load recordings: {:#}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to load recordings: {:#}", e),
            }),
        )
            .into_response();
    }

    let recordings: Vec<CallRecording> = state.session.snapshot().saved_recordings;
    (StatusCode::OK, Json(recordings)).into_response()
}

/// DELETE /recordings/:id
/// Delete a persisted recording
pub async fn delete_recording(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.session.delete_recording(&id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(StatusMessage {
                status: "deleted".to_string(),
                message: format!("Recording {} deleted", id),
            }),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Recording {} not found", id),
            }),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: format!("Failed to delete recording: {:#}", e),
            }),
        )
            .into_response(),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
