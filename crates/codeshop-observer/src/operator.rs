//! Run control endpoints.
//!
//! | Method | Path | Effect |
//! |--------|------|--------|
//! | `POST` | `/api/operator/pause` | Hold the clock and queue loops |
//! | `POST` | `/api/operator/resume` | Release them |
//! | `POST` | `/api/operator/speed` | Change the tick interval |
//! | `POST` | `/api/operator/stop` | End the run |
//! | `GET` | `/api/operator/status` | Run status |

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use codeshop_core::operator::{MIN_TICK_INTERVAL_MS, OperatorStatus};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ObserverError;
use crate::state::AppState;

/// Body of `POST /api/operator/speed`.
#[derive(Debug, Deserialize)]
pub struct SetSpeedRequest {
    /// Milliseconds between ticks, at least [`MIN_TICK_INTERVAL_MS`].
    pub tick_interval_ms: u64,
}

/// Reply to every run control command.
#[derive(Debug, Serialize)]
pub struct ControlResponse {
    /// Always true; refused commands answer with an error instead.
    pub ok: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Interval before a speed change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_interval_ms: Option<u64>,
    /// Interval after a speed change.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_interval_ms: Option<u64>,
}

impl ControlResponse {
    fn done(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            ok: true,
            message: message.into(),
            previous_interval_ms: None,
            new_interval_ms: None,
        })
    }
}

/// Hold both loops and the store clock, so a manual tick is a no-op too.
pub async fn pause(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    state.operator.pause();
    state.command(|store| store.set_paused(true)).await;
    info!("Run paused by operator");
    ControlResponse::done("paused")
}

/// Release the store clock, then the loops.
pub async fn resume(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    state.command(|store| store.set_paused(false)).await;
    state.operator.resume();
    info!("Run resumed by operator");
    ControlResponse::done("resumed")
}

/// Applies from the next sleep between ticks.
pub async fn set_speed(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetSpeedRequest>,
) -> Result<Json<ControlResponse>, ObserverError> {
    let requested = body.tick_interval_ms;
    let Some(previous) = state.operator.set_tick_interval_ms(requested) else {
        return Err(ObserverError::InvalidRequest(format!(
            "tick_interval_ms {requested} is under the {MIN_TICK_INTERVAL_MS} ms floor"
        )));
    };
    info!(previous, requested, "Tick interval changed by operator");

    Ok(Json(ControlResponse {
        ok: true,
        message: format!("tick interval {previous} ms -> {requested} ms"),
        previous_interval_ms: Some(previous),
        new_interval_ms: Some(requested),
    }))
}

/// End the run after the tick and work item in flight. The API stays up.
pub async fn stop(State(state): State<Arc<AppState>>) -> Json<ControlResponse> {
    state.operator.request_stop();
    info!("Stop requested by operator");
    ControlResponse::done("stopping after the current tick")
}

/// `GET /api/operator/status`
pub async fn status(State(state): State<Arc<AppState>>) -> Json<OperatorStatus> {
    let tick = state.store.lock().await.current_tick();
    Json(state.operator.status(tick))
}
