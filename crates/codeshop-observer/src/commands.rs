//! Command endpoints: the mutating half of the presentation surface.
//!
//! Every command answers `200` with [`CommandResponse`]. Unknown or
//! malformed ids make the command a no-op with `ok: false`; they never
//! produce an error status. Events produced by a command are broadcast
//! once the store lock is released.
//!
//! # Endpoints
//!
//! | Method | Path | Store operation |
//! |--------|------|-----------------|
//! | `POST` | `/api/tasks` | `create_task` |
//! | `POST` | `/api/tasks/{id}/assign` | `assign` |
//! | `POST` | `/api/tasks/{id}/unassign` | `unassign` |
//! | `POST` | `/api/tasks/{id}/status` | `update_status` |
//! | `POST` | `/api/employees` | `hire` |
//! | `POST` | `/api/employees/{id}/fire` | `fire` |
//! | `POST` | `/api/queue/enqueue` | `enqueue_ai_work` |
//! | `POST` | `/api/queue/process` | wake the queue loop |
//! | `POST` | `/api/queue/generation` | `set_generation_enabled` |
//! | `POST` | `/api/missions` | `create_mission_with_tasks` |
//! | `POST` | `/api/missions/select` | `select_active_mission` |
//! | `POST` | `/api/missions/{id}/start` | `start_mission` |
//! | `POST` | `/api/missions/{id}/status` | `set_mission_status` |
//! | `POST` | `/api/missions/{id}/complete` | `complete_mission` |
//! | `POST` | `/api/missions/{id}/abandon` | `abandon_mission` |
//! | `POST` | `/api/missions/{id}/tasks` | `add_task_to_mission` |
//! | `POST` | `/api/missions/{id}/commits` | `record_commit` |
//! | `POST` | `/api/advisor/evaluate` | `run_advisor` |
//! | `POST` | `/api/proposals/{id}/approve` | `approve_proposal` |
//! | `POST` | `/api/proposals/{id}/reject` | `reject_proposal` |
//! | `POST` | `/api/proposals/{id}/dismiss` | `dismiss_proposal` |
//! | `POST` | `/api/upgrades/{id}/purchase` | `purchase_upgrade` |
//! | `POST` | `/api/clock/tick` | `tick` |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use codeshop_core::ProposalEffect;
use codeshop_types::{
    EmployeeId, EmployeeRole, MissionId, MissionStatus, Priority, ProposalId, TaskDefinition,
    TaskId, TaskStatus,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Response body of every command.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct CommandResponse {
    /// Whether the command changed anything.
    pub ok: bool,
    /// Id of the entity the command created, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Ids of several created entities (advisor evaluation).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ids: Vec<String>,
}

impl CommandResponse {
    const fn done(ok: bool) -> Self {
        Self {
            ok,
            id: None,
            ids: Vec::new(),
        }
    }

    fn created(id: Option<impl ToString>) -> Self {
        Self {
            ok: id.is_some(),
            id: id.map(|id| id.to_string()),
            ids: Vec::new(),
        }
    }
}

/// Request body for `POST /api/tasks/{id}/assign`.
#[derive(Debug, serde::Deserialize)]
pub struct AssignRequest {
    /// Employee to assign.
    pub employee_id: EmployeeId,
}

/// Request body for `POST /api/tasks/{id}/status`.
#[derive(Debug, serde::Deserialize)]
pub struct TaskStatusRequest {
    /// Target status.
    pub status: TaskStatus,
}

/// Request body for `POST /api/employees`.
#[derive(Debug, serde::Deserialize)]
pub struct HireRequest {
    /// Display name; blank picks one from the role.
    #[serde(default)]
    pub name: String,
    /// Role to hire.
    pub role: EmployeeRole,
}

/// Request body for `POST /api/queue/enqueue`.
#[derive(Debug, serde::Deserialize)]
pub struct EnqueueRequest {
    /// Task to generate work for.
    pub task_id: TaskId,
    /// Employee the work is done as.
    pub employee_id: EmployeeId,
}

/// Request body for `POST /api/queue/generation`.
#[derive(Debug, serde::Deserialize)]
pub struct SetGenerationRequest {
    /// Whether the queue should process work.
    pub enabled: bool,
}

/// Request body for `POST /api/missions`.
#[derive(Debug, serde::Deserialize)]
pub struct CreateMissionRequest {
    /// Mission name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Mission priority.
    #[serde(default)]
    pub priority: Priority,
    /// Backlog tasks to create with the mission.
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

/// Request body for `POST /api/missions/{id}/status`.
#[derive(Debug, serde::Deserialize)]
pub struct MissionStatusRequest {
    /// Target status.
    pub status: MissionStatus,
}

/// Request body for `POST /api/missions/select`.
#[derive(Debug, serde::Deserialize)]
pub struct SelectMissionRequest {
    /// Mission to select; `null` clears the selection.
    pub mission_id: Option<MissionId>,
}

/// Request body for `POST /api/missions/{id}/tasks`.
#[derive(Debug, serde::Deserialize)]
pub struct AddTaskRequest {
    /// Task to link.
    pub task_id: TaskId,
}

/// Request body for `POST /api/missions/{id}/commits`.
#[derive(Debug, serde::Deserialize)]
pub struct CommitRequest {
    /// Commit message.
    pub message: String,
    /// Paths touched by the commit.
    #[serde(default)]
    pub files: Vec<String>,
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Create a task in `todo`.
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Json(definition): Json<TaskDefinition>,
) -> Json<CommandResponse> {
    let id = state.command(|store| store.create_task(&definition)).await;
    Json(CommandResponse::created(Some(id)))
}

/// Assign a task to an employee.
pub async fn assign_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AssignRequest>,
) -> Json<CommandResponse> {
    let Some(task_id) = parse_id::<TaskId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            store.assign(task_id, body.employee_id);
            store
                .task(task_id)
                .is_some_and(|t| t.assignee_id == Some(body.employee_id))
        })
        .await;
    Json(CommandResponse::done(ok))
}

/// Return a task to `todo` without an assignee.
pub async fn unassign_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let Some(task_id) = parse_id::<TaskId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            store.unassign(task_id);
            store.task(task_id).is_some()
        })
        .await;
    Json(CommandResponse::done(ok))
}

/// Move a task to a new status.
pub async fn update_task_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<TaskStatusRequest>,
) -> Json<CommandResponse> {
    let Some(task_id) = parse_id::<TaskId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            store.update_status(task_id, body.status);
            store.task(task_id).is_some_and(|t| t.status == body.status)
        })
        .await;
    Json(CommandResponse::done(ok))
}

// ---------------------------------------------------------------------------
// Employees
// ---------------------------------------------------------------------------

/// Hire an employee, paying the role's salary from the funds pool.
pub async fn hire_employee(
    State(state): State<Arc<AppState>>,
    Json(body): Json<HireRequest>,
) -> Json<CommandResponse> {
    let id = state.command(|store| store.hire(&body.name, body.role)).await;
    Json(CommandResponse::created(id))
}

/// Fire an employee.
pub async fn fire_employee(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let Some(employee_id) = parse_id::<EmployeeId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            let known = store.employee(employee_id).is_some();
            store.fire(employee_id);
            known
        })
        .await;
    Json(CommandResponse::done(ok))
}

// ---------------------------------------------------------------------------
// AI work queue
// ---------------------------------------------------------------------------

/// Submit a task for generation.
pub async fn enqueue_work(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EnqueueRequest>,
) -> Json<CommandResponse> {
    let id = state
        .command(|store| store.enqueue_ai_work(body.task_id, body.employee_id))
        .await;
    Json(CommandResponse::created(id))
}

/// Ask the queue loop to process its next item now.
pub async fn process_queue(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    debug!("Queue processing requested via API");
    state.operator.request_processing();
    Json(CommandResponse::done(true))
}

/// Enable or disable queue processing.
pub async fn set_generation(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SetGenerationRequest>,
) -> Json<CommandResponse> {
    state
        .command(|store| store.set_generation_enabled(body.enabled))
        .await;
    Json(CommandResponse::done(true))
}

// ---------------------------------------------------------------------------
// Missions
// ---------------------------------------------------------------------------

/// Create a mission, optionally with backlog tasks.
pub async fn create_mission(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateMissionRequest>,
) -> Json<CommandResponse> {
    let id = state
        .command(|store| {
            store.create_mission_with_tasks(
                &body.name,
                &body.description,
                body.priority,
                &body.tasks,
            )
        })
        .await;
    Json(CommandResponse::created(Some(id)))
}

/// Select the active mission or clear the selection.
pub async fn select_mission(
    State(state): State<Arc<AppState>>,
    Json(body): Json<SelectMissionRequest>,
) -> Json<CommandResponse> {
    let ok = state
        .command(|store| {
            store.select_active_mission(body.mission_id);
            store.active_mission() == body.mission_id
        })
        .await;
    Json(CommandResponse::done(ok))
}

/// Start a mission: its backlog tasks move to `todo`.
pub async fn start_mission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    mission_transition(&state, &id, MissionStatus::Active).await
}

/// Move a mission to any allowed status.
pub async fn set_mission_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<MissionStatusRequest>,
) -> Json<CommandResponse> {
    mission_transition(&state, &id, body.status).await
}

/// Complete a mission.
pub async fn complete_mission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    mission_transition(&state, &id, MissionStatus::Completed).await
}

/// Abandon a mission.
pub async fn abandon_mission(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    mission_transition(&state, &id, MissionStatus::Abandoned).await
}

async fn mission_transition(
    state: &AppState,
    id: &str,
    status: MissionStatus,
) -> Json<CommandResponse> {
    let Some(mission_id) = parse_id::<MissionId>(id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            match status {
                MissionStatus::Active => store.start_mission(mission_id),
                MissionStatus::Completed => store.complete_mission(mission_id),
                MissionStatus::Abandoned => store.abandon_mission(mission_id),
                other => store.set_mission_status(mission_id, other),
            }
            store.mission(mission_id).is_some_and(|m| m.status == status)
        })
        .await;
    Json(CommandResponse::done(ok))
}

/// Link an existing task to a mission.
pub async fn add_mission_task(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<AddTaskRequest>,
) -> Json<CommandResponse> {
    let Some(mission_id) = parse_id::<MissionId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| {
            store.add_task_to_mission(mission_id, body.task_id);
            store
                .mission(mission_id)
                .is_some_and(|m| m.task_ids.contains(&body.task_id))
        })
        .await;
    Json(CommandResponse::done(ok))
}

/// Append a commit to a mission.
pub async fn record_commit(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CommitRequest>,
) -> Json<CommandResponse> {
    let Some(mission_id) = parse_id::<MissionId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let commit_id = state
        .command(|store| store.record_commit(mission_id, &body.message, body.files))
        .await;
    Json(CommandResponse::created(commit_id))
}

// ---------------------------------------------------------------------------
// Advisor and proposals
// ---------------------------------------------------------------------------

/// Run an advisor evaluation now, regardless of the interval.
pub async fn evaluate_advisor(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    let created = state.command(|store| store.run_advisor()).await;
    info!(proposals = created.len(), "Advisor evaluation requested via API");
    Json(CommandResponse {
        ok: true,
        id: None,
        ids: created.iter().map(ToString::to_string).collect(),
    })
}

/// Approve a pending proposal and apply its effect.
pub async fn approve_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let Some(proposal_id) = parse_id::<ProposalId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let effect = state
        .command(|store| store.approve_proposal(proposal_id))
        .await;
    Json(match effect {
        Some(ProposalEffect::MissionCreated(mission_id)) => {
            CommandResponse::created(Some(mission_id))
        }
        Some(_) => CommandResponse::done(true),
        None => CommandResponse::done(false),
    })
}

/// Reject a pending proposal.
pub async fn reject_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let Some(proposal_id) = parse_id::<ProposalId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| store.reject_proposal(proposal_id))
        .await;
    Json(CommandResponse::done(ok))
}

/// Remove a pending proposal without deciding it.
pub async fn dismiss_proposal(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let Some(proposal_id) = parse_id::<ProposalId>(&id) else {
        return Json(CommandResponse::done(false));
    };
    let ok = state
        .command(|store| store.dismiss_proposal(proposal_id))
        .await;
    Json(CommandResponse::done(ok))
}

// ---------------------------------------------------------------------------
// Treasury and clock
// ---------------------------------------------------------------------------

/// Buy an upgrade from the catalog.
pub async fn purchase_upgrade(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<CommandResponse> {
    let ok = state.command(|store| store.purchase_upgrade(&id)).await;
    Json(CommandResponse::done(ok))
}

/// Advance the clock by one tick. A no-op while paused.
pub async fn tick_clock(State(state): State<Arc<AppState>>) -> Json<CommandResponse> {
    let summary = state.command(|store| store.tick()).await;
    Json(CommandResponse::done(summary.is_some()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a path segment into a typed id; malformed ids are `None`.
fn parse_id<T: From<Uuid>>(s: &str) -> Option<T> {
    s.parse::<Uuid>().ok().map(T::from)
}
