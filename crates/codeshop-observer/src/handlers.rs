//! Read-only REST handlers for the Observer server.
//!
//! Every handler takes the store lock briefly, copies out what it needs,
//! and releases it before serializing.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/state` | Company overview |
//! | `GET` | `/api/tasks` | List tasks (by status or mission) |
//! | `GET` | `/api/tasks/{id}` | Single task |
//! | `GET` | `/api/employees` | List employees |
//! | `GET` | `/api/employees/{id}` | Single employee |
//! | `GET` | `/api/missions` | List missions |
//! | `GET` | `/api/missions/{id}` | Mission plus its tasks |
//! | `GET` | `/api/proposals` | List proposals (by status) |
//! | `GET` | `/api/queue` | AI work queue |
//! | `GET` | `/api/notifications` | Recent notifications |
//! | `GET` | `/api/advisor` | Advisor thoughts and product state |
//! | `GET` | `/api/ledger` | Funds, ledger, upgrade catalog |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::{Html, IntoResponse};
use codeshop_core::advisor::ProductState;
use codeshop_types::{
    AiWorkItem, CompanyStats, Employee, EmployeeId, LedgerEntry, Mission, MissionId,
    Notification, Proposal, ProposalId, ProposalStatus, Task, TaskId, TaskStatus, Thought,
    Upgrade,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ObserverError;
use crate::state::AppState;

/// Default number of notifications returned.
const DEFAULT_NOTIFICATION_LIMIT: usize = 50;

// ---------------------------------------------------------------------------
// Query parameters and views
// ---------------------------------------------------------------------------

/// Query parameters for `GET /api/tasks`.
#[derive(Debug, serde::Deserialize)]
pub struct TasksQuery {
    /// Only tasks with this status.
    pub status: Option<TaskStatus>,
    /// Only tasks belonging to this mission.
    pub mission_id: Option<Uuid>,
}

/// Query parameters for `GET /api/proposals`.
#[derive(Debug, serde::Deserialize)]
pub struct ProposalsQuery {
    /// Only proposals with this status.
    pub status: Option<ProposalStatus>,
}

/// Query parameters for `GET /api/notifications`.
#[derive(Debug, serde::Deserialize)]
pub struct NotificationsQuery {
    /// Maximum number to return, newest first (default 50).
    pub limit: Option<usize>,
}

/// Response body for `GET /api/state`.
#[derive(Debug, serde::Serialize)]
pub struct CompanyOverview {
    /// Company name from the configuration.
    pub company: String,
    /// Current tick.
    pub tick: u64,
    /// Whether the store clock is paused.
    pub paused: bool,
    /// Shared funds pool.
    pub funds: Decimal,
    /// Whether the AI queue processes work.
    pub generation_enabled: bool,
    /// The selected mission.
    pub active_mission: Option<MissionId>,
    /// Number of tasks.
    pub tasks: usize,
    /// Number of employees.
    pub employees: usize,
    /// Number of missions.
    pub missions: usize,
    /// Number of pending proposals.
    pub pending_proposals: usize,
    /// Queued plus in-flight work items.
    pub queue_length: usize,
    /// Running counters.
    pub stats: CompanyStats,
    /// The product as the advisor would see it now.
    pub product: ProductState,
}

/// Response body for `GET /api/missions/{id}`.
#[derive(Debug, serde::Serialize)]
pub struct MissionDetail {
    /// The mission.
    #[serde(flatten)]
    pub mission: Mission,
    /// The mission's tasks in mission order.
    pub tasks: Vec<Task>,
}

/// Response body for `GET /api/queue`.
#[derive(Debug, serde::Serialize)]
pub struct QueueView {
    /// Whether processing is enabled.
    pub generation_enabled: bool,
    /// The item being generated, if any.
    pub in_flight: Option<AiWorkItem>,
    /// Waiting items in processing order.
    pub queued: Vec<AiWorkItem>,
}

/// Response body for `GET /api/advisor`.
#[derive(Debug, serde::Serialize)]
pub struct AdvisorView {
    /// Tick of the last evaluation.
    pub last_evaluated_tick: u64,
    /// Evaluations run so far.
    pub evaluations: u64,
    /// Whether an evaluation is due.
    pub due: bool,
    /// Recent thoughts, oldest first.
    pub thoughts: Vec<Thought>,
    /// Product state at the last evaluation.
    pub last_state: Option<ProductState>,
    /// Product state now.
    pub current_state: ProductState,
}

/// Response body for `GET /api/ledger`.
#[derive(Debug, serde::Serialize)]
pub struct LedgerView {
    /// Current funds.
    pub funds: Decimal,
    /// Every expenditure, oldest first.
    pub entries: Vec<LedgerEntry>,
    /// The upgrade catalog with purchase state.
    pub upgrades: Vec<Upgrade>,
}

// ---------------------------------------------------------------------------
// GET /
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing the company and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (name, tick, funds, tasks, employees) = {
        let store = state.store.lock().await;
        (
            store.config().simulation.name.clone(),
            store.current_tick(),
            store.funds(),
            store.tasks().count(),
            store.employees().count(),
        )
    };
    let paused = state.operator.is_paused();

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>{name} Observer</title>
    <style>
        body {{ background: #101418; color: #d0d7de; font-family: monospace; padding: 2rem; }}
        a {{ color: #79c0ff; }}
        td {{ padding-right: 2rem; }}
    </style>
</head>
<body>
    <h1>{name}</h1>
    <table>
        <tr><td>Tick</td><td>{tick}</td></tr>
        <tr><td>Paused</td><td>{paused}</td></tr>
        <tr><td>Funds</td><td>{funds}</td></tr>
        <tr><td>Tasks</td><td>{tasks}</td></tr>
        <tr><td>Employees</td><td>{employees}</td></tr>
    </table>
    <h2>API</h2>
    <ul>
        <li><a href="/api/state">/api/state</a></li>
        <li><a href="/api/tasks">/api/tasks</a></li>
        <li><a href="/api/employees">/api/employees</a></li>
        <li><a href="/api/missions">/api/missions</a></li>
        <li><a href="/api/proposals">/api/proposals</a></li>
        <li><a href="/api/queue">/api/queue</a></li>
        <li><a href="/api/advisor">/api/advisor</a></li>
        <li><a href="/api/ledger">/api/ledger</a></li>
        <li><a href="/api/operator/status">/api/operator/status</a></li>
        <li>/ws/events (WebSocket)</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/state
// ---------------------------------------------------------------------------

/// Company overview.
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<CompanyOverview> {
    let store = state.store.lock().await;
    Json(CompanyOverview {
        company: store.config().simulation.name.clone(),
        tick: store.current_tick(),
        paused: store.is_paused(),
        funds: store.funds(),
        generation_enabled: store.generation_enabled(),
        active_mission: store.active_mission(),
        tasks: store.tasks().count(),
        employees: store.employees().count(),
        missions: store.missions().count(),
        pending_proposals: store.pending_proposals().count(),
        queue_length: store.queue().len(),
        stats: store.stats().clone(),
        product: store.product_state(),
    })
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// List tasks, optionally filtered by status and mission.
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Query(params): Query<TasksQuery>,
) -> Json<Vec<Task>> {
    let mission_id = params.mission_id.map(MissionId::from);
    let store = state.store.lock().await;
    let tasks = store
        .tasks()
        .filter(|t| params.status.is_none_or(|s| t.status == s))
        .filter(|t| mission_id.is_none_or(|m| t.mission_id == Some(m)))
        .cloned()
        .collect();
    Json(tasks)
}

/// Get a single task.
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ObserverError> {
    let task_id = TaskId::from(parse_uuid(&id)?);
    let store = state.store.lock().await;
    store
        .task(task_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("task {id}")))
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// List employees in hiring order.
pub async fn list_employees(State(state): State<Arc<AppState>>) -> Json<Vec<Employee>> {
    let store = state.store.lock().await;
    Json(store.employees().cloned().collect())
}

/// Get a single employee, memory included.
pub async fn get_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ObserverError> {
    let employee_id = EmployeeId::from(parse_uuid(&id)?);
    let store = state.store.lock().await;
    store
        .employee(employee_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("employee {id}")))
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// List missions.
pub async fn list_missions(State(state): State<Arc<AppState>>) -> Json<Vec<Mission>> {
    let store = state.store.lock().await;
    Json(store.missions().cloned().collect())
}

/// Get a mission together with its tasks.
pub async fn get_mission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<MissionDetail>, ObserverError> {
    let mission_id = MissionId::from(parse_uuid(&id)?);
    let store = state.store.lock().await;
    let mission = store
        .mission(mission_id)
        .cloned()
        .ok_or_else(|| ObserverError::NotFound(format!("mission {id}")))?;
    let tasks = mission
        .task_ids
        .iter()
        .filter_map(|task_id| store.task(*task_id).cloned())
        .collect();
    Ok(Json(MissionDetail { mission, tasks }))
}

// ---------------------------------------------------------------------------
// Proposals, queue, notifications
// ---------------------------------------------------------------------------

/// List proposals, optionally filtered by status.
pub async fn list_proposals(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ProposalsQuery>,
) -> Json<Vec<Proposal>> {
    let store = state.store.lock().await;
    let proposals = store
        .proposals()
        .filter(|p| params.status.is_none_or(|s| p.status == s))
        .cloned()
        .collect();
    Json(proposals)
}

/// Get a single proposal.
pub async fn get_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Proposal>, ObserverError> {
    let proposal_id = ProposalId::from(parse_uuid(&id)?);
    let store = state.store.lock().await;
    store
        .proposal(proposal_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| ObserverError::NotFound(format!("proposal {id}")))
}

/// The AI work queue.
pub async fn get_queue(State(state): State<Arc<AppState>>) -> Json<QueueView> {
    let store = state.store.lock().await;
    let queue = store.queue();
    Json(QueueView {
        generation_enabled: store.generation_enabled(),
        in_flight: queue.in_flight().cloned(),
        queued: queue.queued().to_vec(),
    })
}

/// Recent notifications, newest first.
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NotificationsQuery>,
) -> Json<Vec<Notification>> {
    let limit = params.limit.unwrap_or(DEFAULT_NOTIFICATION_LIMIT);
    let store = state.store.lock().await;
    let mut notifications: Vec<Notification> = store.notifications().cloned().collect();
    notifications.reverse();
    notifications.truncate(limit);
    Json(notifications)
}

// ---------------------------------------------------------------------------
// Advisor and ledger
// ---------------------------------------------------------------------------

/// Advisor state: thoughts plus last and current product state.
pub async fn get_advisor(State(state): State<Arc<AppState>>) -> Json<AdvisorView> {
    let store = state.store.lock().await;
    let advisor = store.advisor();
    Json(AdvisorView {
        last_evaluated_tick: advisor.last_evaluated_tick(),
        evaluations: advisor.evaluations(),
        due: store.advisor_due(),
        thoughts: advisor.thoughts().cloned().collect(),
        last_state: advisor.last_state().cloned(),
        current_state: store.product_state(),
    })
}

/// Treasury funds, ledger entries, and the upgrade catalog.
pub async fn get_ledger(State(state): State<Arc<AppState>>) -> Json<LedgerView> {
    let store = state.store.lock().await;
    Json(LedgerView {
        funds: store.funds(),
        entries: store.ledger().to_vec(),
        upgrades: store.upgrades().to_vec(),
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a UUID path segment.
fn parse_uuid(s: &str) -> Result<Uuid, ObserverError> {
    s.parse::<Uuid>()
        .map_err(|e| ObserverError::InvalidUuid(format!("{s}: {e}")))
}
