//! Axum router construction for the Observer API.
//!
//! Assembles the read endpoints, the command endpoints, the operator
//! endpoints, and the `WebSocket` into a single [`Router`] with CORS open
//! for the dashboard.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;
use crate::{commands, handlers, operator, ws};

/// Build the complete Axum router for the Observer server.
///
/// See the [`handlers`], [`commands`], and [`operator`] modules for the
/// route tables.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Status page
        .route("/", get(handlers::index))
        // WebSocket
        .route("/ws/events", get(ws::ws_events))
        // Queries
        .route("/api/state", get(handlers::get_state))
        .route("/api/tasks", get(handlers::list_tasks).post(commands::create_task))
        .route("/api/tasks/{id}", get(handlers::get_task))
        .route("/api/tasks/{id}/assign", post(commands::assign_task))
        .route("/api/tasks/{id}/unassign", post(commands::unassign_task))
        .route("/api/tasks/{id}/status", post(commands::update_task_status))
        .route(
            "/api/employees",
            get(handlers::list_employees).post(commands::hire_employee),
        )
        .route("/api/employees/{id}", get(handlers::get_employee))
        .route("/api/employees/{id}/fire", post(commands::fire_employee))
        .route(
            "/api/missions",
            get(handlers::list_missions).post(commands::create_mission),
        )
        .route("/api/missions/select", post(commands::select_mission))
        .route("/api/missions/{id}", get(handlers::get_mission))
        .route("/api/missions/{id}/start", post(commands::start_mission))
        .route("/api/missions/{id}/status", post(commands::set_mission_status))
        .route("/api/missions/{id}/complete", post(commands::complete_mission))
        .route("/api/missions/{id}/abandon", post(commands::abandon_mission))
        .route("/api/missions/{id}/tasks", post(commands::add_mission_task))
        .route("/api/missions/{id}/commits", post(commands::record_commit))
        .route("/api/proposals", get(handlers::list_proposals))
        .route("/api/proposals/{id}", get(handlers::get_proposal))
        .route("/api/proposals/{id}/approve", post(commands::approve_proposal))
        .route("/api/proposals/{id}/reject", post(commands::reject_proposal))
        .route("/api/proposals/{id}/dismiss", post(commands::dismiss_proposal))
        .route("/api/queue", get(handlers::get_queue))
        .route("/api/queue/enqueue", post(commands::enqueue_work))
        .route("/api/queue/process", post(commands::process_queue))
        .route("/api/queue/generation", post(commands::set_generation))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/advisor", get(handlers::get_advisor))
        .route("/api/advisor/evaluate", post(commands::evaluate_advisor))
        .route("/api/ledger", get(handlers::get_ledger))
        .route("/api/upgrades/{id}/purchase", post(commands::purchase_upgrade))
        .route("/api/clock/tick", post(commands::tick_clock))
        // Operator
        .route("/api/operator/pause", post(operator::pause))
        .route("/api/operator/resume", post(operator::resume))
        .route("/api/operator/speed", post(operator::set_speed))
        .route("/api/operator/stop", post(operator::stop))
        .route("/api/operator/status", get(operator::status))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
