//! HTTP endpoint handlers
//!
//! The workout session layer drives the timer through these endpoints. Range
//! validation of request bodies happens here, at the caller boundary; the
//! state machine itself clamps rather than errors.

use std::sync::Arc;
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use tracing::error;

use crate::state::{AppState, TimerSettingsPatch};
use super::responses::{ApiResponse, HealthResponse, SettingsResponse, StatusResponse, TimerSnapshot};

/// Body for POST /timer/start; both fields optional, `{}` is valid
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StartRequest {
    /// Rest duration in seconds; defaults to the configured default rest time
    pub seconds: Option<u64>,
    /// Opaque identifier of the set this rest period follows
    pub set_id: Option<i64>,
}

/// Body for POST /timer/add and /timer/subtract
#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub seconds: u64,
}

fn internal_error(e: String) -> StatusCode {
    error!("Timer state unavailable: {}", e);
    StatusCode::INTERNAL_SERVER_ERROR
}

/// Handle POST /timer/start - Start a rest countdown
pub async fn start_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if let Some(0) = request.seconds {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = state
        .with_timer("start", |timer| {
            let seconds = request
                .seconds
                .unwrap_or(timer.settings().default_rest_time);
            timer.start(seconds, request.set_id);
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Rest timer started".to_string(),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/pause - Freeze the running countdown
pub async fn pause_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let snapshot = state
        .with_timer("pause", |timer| {
            timer.pause();
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Rest timer paused".to_string(),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/resume - Resume a paused countdown
pub async fn resume_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let snapshot = state
        .with_timer("resume", |timer| {
            timer.resume();
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Rest timer resumed".to_string(),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/skip - Cancel without completion effects
pub async fn skip_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let snapshot = state
        .with_timer("skip", |timer| {
            timer.skip();
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Rest timer skipped".to_string(),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/reset - Return to the idle default
pub async fn reset_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse>, StatusCode> {
    let snapshot = state
        .with_timer("reset", |timer| {
            timer.reset();
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        "Rest timer reset".to_string(),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/add - Extend the countdown
pub async fn add_time_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if request.seconds == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = state
        .with_timer("add_time", |timer| {
            timer.add_time(request.seconds);
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        format!("Added {} seconds", request.seconds),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle POST /timer/subtract - Shorten the countdown
pub async fn subtract_time_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<ApiResponse>, StatusCode> {
    if request.seconds == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let snapshot = state
        .with_timer("subtract_time", |timer| {
            timer.subtract_time(request.seconds);
            timer.snapshot()
        })
        .map_err(internal_error)?;

    Ok(Json(ApiResponse::ok(
        format!("Subtracted {} seconds", request.seconds),
        TimerSnapshot::from(snapshot),
    )))
}

/// Handle GET /timer - Current timer snapshot
pub async fn timer_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TimerSnapshot>, StatusCode> {
    let snapshot = state
        .read_timer(|timer| timer.snapshot())
        .map_err(internal_error)?;

    Ok(Json(TimerSnapshot::from(snapshot)))
}

/// Handle GET /settings - Current settings and preset intervals
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let settings = state
        .read_timer(|timer| timer.settings().clone())
        .map_err(internal_error)?;

    Ok(Json(SettingsResponse::new(settings)))
}

/// Handle POST /settings - Merge a partial settings update
pub async fn update_settings_handler(
    State(state): State<Arc<AppState>>,
    Json(patch): Json<TimerSettingsPatch>,
) -> Result<Json<SettingsResponse>, StatusCode> {
    let settings = state
        .with_timer("update_settings", |timer| {
            timer.update_settings(patch);
            timer.settings().clone()
        })
        .map_err(internal_error)?;

    Ok(Json(SettingsResponse::new(settings)))
}

/// Handle GET /status - Full server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, StatusCode> {
    let (snapshot, settings) = state
        .read_timer(|timer| (timer.snapshot(), timer.settings().clone()))
        .map_err(internal_error)?;

    let (last_action, last_action_time) = state.get_last_action();

    Ok(Json(StatusResponse {
        timer: TimerSnapshot::from(snapshot),
        settings,
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
        last_action,
        last_action_time,
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
