use super::state::AppState;
use crate::error::SessionError;
use crate::models::{Phase, SlotId};
use crate::session::{
    InterviewSession, SessionCommand, SessionConfig, SessionHandle, SessionStatus, SessionSummary,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info, warn};

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct StartSessionRequest {
    /// Optional session ID (if not provided, generate UUID)
    pub session_id: Option<String>,

    /// Planning phase length in seconds (default from config)
    pub planning_seconds: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct StartSessionResponse {
    pub session_id: String,
    pub status: SessionStatus,
}

#[derive(Debug, Serialize)]
pub struct FinishSessionResponse {
    pub session_id: String,
    pub status: String,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize)]
pub struct LeaveSessionResponse {
    pub session_id: String,
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_response(status: StatusCode, error: impl ToString) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
        }),
    )
        .into_response()
}

fn session_error_response(err: &SessionError) -> Response {
    let status = match err {
        SessionError::InvalidIndex { .. } => StatusCode::BAD_REQUEST,
        SessionError::SlotNotActive { .. } | SessionError::InvalidTransition { .. } => {
            StatusCode::CONFLICT
        }
        SessionError::SessionClosed => StatusCode::GONE,
        SessionError::UnsupportedEnvironment => StatusCode::SERVICE_UNAVAILABLE,
        SessionError::Api(_) | SessionError::IncompleteQuestionSet { .. } => StatusCode::BAD_GATEWAY,
        SessionError::RecognitionEngine(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err)
}

async fn find_session(state: &AppState, session_id: &str) -> Result<SessionHandle, Response> {
    let sessions = state.sessions.read().await;
    sessions.get(session_id).cloned().ok_or_else(|| {
        error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        )
    })
}

/// Send a command and answer with the resulting status
async fn apply_command(state: &AppState, session_id: &str, command: SessionCommand) -> Response {
    let handle = match find_session(state, session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    match handle.send(command).await {
        Ok(_) => (StatusCode::OK, Json(handle.status())).into_response(),
        Err(e) => {
            warn!("Session {}: {:?} rejected: {}", session_id, command, e);
            session_error_response(&e)
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /sessions
/// Fetch a question set and start the planning countdown
pub async fn start_session(
    State(state): State<AppState>,
    body: Option<Json<StartSessionRequest>>,
) -> impl IntoResponse {
    let req = body.map(|Json(req)| req).unwrap_or_default();

    let mut config = SessionConfig {
        session_id: req
            .session_id
            .unwrap_or_else(|| format!("interview-{}", uuid::Uuid::new_v4())),
        ..state.session_defaults.clone()
    };
    if let Some(seconds) = req.planning_seconds.filter(|s| *s > 0) {
        config.planning_duration = Duration::from_secs(seconds);
    }
    let session_id = config.session_id.clone();

    info!("Starting interview session: {}", session_id);

    // Check if already running
    {
        let sessions = state.sessions.read().await;
        if sessions.contains_key(&session_id) {
            return error_response(
                StatusCode::CONFLICT,
                format!("Session {} is already running", session_id),
            );
        }
    }

    let recognizer = state.engines.recognizer(&session_id, &config.locale);
    let mut session = InterviewSession::new(
        config,
        state.api.clone(),
        recognizer,
        state.engines.synthesizer(),
    );

    if let Err(e) = session.start().await {
        error!("Failed to start session: {}", e);
        return session_error_response(&e);
    }

    let handle = session.spawn();
    let status = handle.status();

    {
        let mut sessions = state.sessions.write().await;
        sessions.insert(session_id.clone(), handle);
    }

    (
        StatusCode::OK,
        Json(StartSessionResponse { session_id, status }),
    )
        .into_response()
}

/// GET /sessions/:session_id
pub async fn get_session_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    match find_session(&state, &session_id).await {
        Ok(handle) => (StatusCode::OK, Json(handle.status())).into_response(),
        Err(response) => response,
    }
}

/// POST /sessions/:session_id/planning/finish
pub async fn finish_planning(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    apply_command(&state, &session_id, SessionCommand::FinishPlanning).await
}

/// POST /sessions/:session_id/slots/:phase/:index/lock
pub async fn lock_slot(
    State(state): State<AppState>,
    Path((session_id, phase, index)): Path<(String, Phase, usize)>,
) -> impl IntoResponse {
    apply_command(
        &state,
        &session_id,
        SessionCommand::Lock(SlotId::new(phase, index)),
    )
    .await
}

/// POST /sessions/:session_id/immediate/start
pub async fn start_immediate(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    apply_command(&state, &session_id, SessionCommand::StartImmediate).await
}

/// POST /sessions/:session_id/finish
/// Submit the session log; the session is discarded either way
pub async fn finish_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let handle = match find_session(&state, &session_id).await {
        Ok(handle) => handle,
        Err(response) => return response,
    };

    let result = handle.send(SessionCommand::Finish).await;

    if !matches!(result, Err(SessionError::InvalidTransition { .. })) {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id);
    }

    match result {
        Ok(Some(summary)) => {
            info!("Session {} finished", session_id);
            (
                StatusCode::OK,
                Json(FinishSessionResponse {
                    session_id,
                    status: "finished".to_string(),
                    summary,
                }),
            )
                .into_response()
        }
        Ok(None) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Session finished without a summary",
        ),
        Err(e) => {
            error!("Failed to finish session {}: {}", session_id, e);
            session_error_response(&e)
        }
    }
}

/// DELETE /sessions/:session_id
/// Leave the session; nothing is persisted
pub async fn leave_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let handle = {
        let mut sessions = state.sessions.write().await;
        sessions.remove(&session_id)
    };

    match handle {
        Some(handle) => {
            if let Err(e) = handle.send(SessionCommand::Leave).await {
                warn!("Session {} already closed: {}", session_id, e);
            }
            info!("Left session {}", session_id);
            (
                StatusCode::OK,
                Json(LeaveSessionResponse {
                    session_id,
                    status: "cancelled".to_string(),
                }),
            )
                .into_response()
        }
        None => error_response(
            StatusCode::NOT_FOUND,
            format!("Session {} not found", session_id),
        ),
    }
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
