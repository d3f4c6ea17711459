//! Mission Service: feature initiatives with a branch, a lifecycle, and an
//! append-only commit history.
//!
//! `planning -> active -> review -> merging -> completed` only moves
//! forward (stages may be skipped). `abandoned` is reachable from any
//! non-terminal state. Both terminal states close the mission for good.

use codeshop_types::{
    Change, Commit, CommitId, EmployeeId, Mission, MissionId, MissionStatus, Priority,
    PullRequestRef, Severity, TaskDefinition, TaskId, TaskStatus,
};
use tracing::{info, warn};

use crate::store::EntityStore;

/// Longest slug kept in a branch name.
const MAX_SLUG_LEN: usize = 48;

/// Lowercase, dash-separated form of `text` with only ASCII letters and
/// digits. Empty when `text` has none.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
        if slug.len() >= MAX_SLUG_LEN {
            break;
        }
    }
    slug.trim_end_matches('-').to_owned()
}

/// Branch name for a mission: `feature/<slug>`, or `feature/mission-<id>`
/// when the name has no usable characters.
pub fn branch_name(name: &str, id: MissionId) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("feature/mission-{}", id.short())
    } else {
        format!("feature/{slug}")
    }
}

impl EntityStore {
    /// Create a mission in `planning`. Returns the new id.
    pub fn create_mission(&mut self, name: &str, description: &str, priority: Priority) -> MissionId {
        let id = MissionId::new();
        let mission = Mission {
            id,
            name: name.trim().to_owned(),
            description: description.to_owned(),
            priority,
            status: MissionStatus::Planning,
            branch_name: branch_name(name, id),
            task_ids: Vec::new(),
            commits: Vec::new(),
            pull_request: None,
            created_at: self.clock.tick(),
            closed_at: None,
        };
        info!(mission_id = %id, branch = %mission.branch_name, "Mission created");
        self.missions.insert(id, mission);
        self.emit(Change::MissionCreated { mission_id: id });
        id
    }

    /// Create a mission plus one backlog task per definition, linked in
    /// order.
    pub fn create_mission_with_tasks(
        &mut self,
        name: &str,
        description: &str,
        priority: Priority,
        tasks: &[TaskDefinition],
    ) -> MissionId {
        let mission_id = self.create_mission(name, description, priority);
        let task_ids: Vec<TaskId> = tasks
            .iter()
            .map(|definition| self.insert_task(definition, TaskStatus::Backlog, Some(mission_id)))
            .collect();
        if let Some(mission) = self.missions.get_mut(&mission_id) {
            mission.task_ids = task_ids;
        }
        mission_id
    }

    /// Move a planning mission to `active`, release its backlog tasks to
    /// `todo`, and select it as the active mission.
    pub fn start_mission(&mut self, mission_id: MissionId) {
        let is_planning = self
            .missions
            .get(&mission_id)
            .is_some_and(|m| m.status == MissionStatus::Planning);
        if !is_planning {
            return;
        }
        self.set_mission_status(mission_id, MissionStatus::Active);

        let task_ids = self
            .missions
            .get(&mission_id)
            .map(|m| m.task_ids.clone())
            .unwrap_or_default();
        for task_id in task_ids {
            if let Some(task) = self.tasks.get_mut(&task_id)
                && task.status == TaskStatus::Backlog
            {
                task.status = TaskStatus::Todo;
                self.emit(Change::TaskStatusChanged {
                    task_id,
                    status: TaskStatus::Todo,
                });
            }
        }
        self.select_active_mission(Some(mission_id));
    }

    /// Move a mission along its lifecycle. Invalid transitions are logged
    /// and ignored.
    ///
    /// Entering `review` opens a pull request reference. Entering
    /// `completed` counts a shipped feature. Both terminal states clear the
    /// active-mission selection if it pointed here.
    pub fn set_mission_status(&mut self, mission_id: MissionId, status: MissionStatus) {
        let tick = self.clock.tick();
        let pr_number = self.next_pull_request;
        let Some(mission) = self.missions.get_mut(&mission_id) else {
            return;
        };
        if !mission.status.can_transition_to(status) {
            warn!(
                mission_id = %mission_id,
                from = ?mission.status,
                to = ?status,
                "Invalid mission transition ignored"
            );
            return;
        }
        mission.status = status;
        let name = mission.name.clone();

        let mut opened_pr = false;
        if status == MissionStatus::Review && mission.pull_request.is_none() {
            mission.pull_request = Some(PullRequestRef {
                number: pr_number,
                title: format!("{}: {}", mission.branch_name, mission.name),
                opened_at: tick,
            });
            opened_pr = true;
        }
        if status.is_terminal() {
            mission.closed_at = Some(tick);
        }

        if opened_pr {
            self.next_pull_request = self.next_pull_request.saturating_add(1);
        }
        info!(mission_id = %mission_id, status = ?status, "Mission status changed");
        self.emit(Change::MissionStatusChanged { mission_id, status });

        match status {
            MissionStatus::Completed => {
                self.stats.features_shipped = self.stats.features_shipped.saturating_add(1);
                self.clear_active_if(mission_id);
                self.notify(format!("Shipped {name}"), Severity::Success);
            }
            MissionStatus::Abandoned => {
                self.clear_active_if(mission_id);
                self.notify(format!("Abandoned {name}"), Severity::Info);
            }
            _ => {}
        }
    }

    /// Complete a mission from any non-terminal state.
    pub fn complete_mission(&mut self, mission_id: MissionId) {
        self.set_mission_status(mission_id, MissionStatus::Completed);
    }

    /// Abandon a mission from any non-terminal state.
    pub fn abandon_mission(&mut self, mission_id: MissionId) {
        self.set_mission_status(mission_id, MissionStatus::Abandoned);
    }

    /// Select the mission shown as active, or clear the selection. Unknown
    /// and closed missions are ignored.
    pub fn select_active_mission(&mut self, mission_id: Option<MissionId>) {
        if let Some(id) = mission_id
            && !self.missions.get(&id).is_some_and(|m| !m.status.is_terminal())
        {
            return;
        }
        if self.active_mission != mission_id {
            self.active_mission = mission_id;
            self.emit(Change::ActiveMissionChanged { mission_id });
        }
    }

    /// Link an existing task to an open mission, moving it out of any
    /// other mission. Duplicates are ignored.
    pub fn add_task_to_mission(&mut self, mission_id: MissionId, task_id: TaskId) {
        let mission_open = self
            .missions
            .get(&mission_id)
            .is_some_and(|m| !m.status.is_terminal());
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return;
        };
        if !mission_open || task.mission_id == Some(mission_id) {
            return;
        }
        let previous = task.mission_id.replace(mission_id);

        if let Some(previous) = previous.and_then(|id| self.missions.get_mut(&id)) {
            previous.task_ids.retain(|id| *id != task_id);
        }
        if let Some(mission) = self.missions.get_mut(&mission_id)
            && !mission.task_ids.contains(&task_id)
        {
            mission.task_ids.push(task_id);
        }
    }

    /// Append a commit to a mission. Returns the commit id, or `None` for
    /// an unknown mission.
    pub fn record_commit(
        &mut self,
        mission_id: MissionId,
        message: &str,
        files: Vec<String>,
    ) -> Option<CommitId> {
        self.append_commit(mission_id, message.to_owned(), None, None, files)
    }

    pub(crate) fn append_commit(
        &mut self,
        mission_id: MissionId,
        message: String,
        author_id: Option<EmployeeId>,
        task_id: Option<TaskId>,
        files: Vec<String>,
    ) -> Option<CommitId> {
        let tick = self.clock.tick();
        let mission = self.missions.get_mut(&mission_id)?;
        let id = CommitId::new();
        mission.commits.push(Commit {
            id,
            sha: id.short(),
            message,
            author_id,
            task_id,
            files,
            tick,
        });
        self.emit(Change::CommitRecorded {
            mission_id,
            commit_id: id,
        });
        Some(id)
    }

    fn clear_active_if(&mut self, mission_id: MissionId) {
        if self.active_mission == Some(mission_id) {
            self.active_mission = None;
            self.emit(Change::ActiveMissionChanged { mission_id: None });
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::TaskType;

    use super::*;
    use crate::store::tests::{assert_invariants, store_with};

    fn defs() -> Vec<TaskDefinition> {
        vec![
            TaskDefinition::new("Schema", "", TaskType::Infrastructure, 3),
            TaskDefinition::new("Endpoint", "", TaskType::Feature, 5),
        ]
    }

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  User Auth: OAuth 2.0!  "), "user-auth-oauth-2-0");
        assert_eq!(slugify("***"), "");
    }

    #[test]
    fn branch_name_falls_back_to_id() {
        let id = MissionId::new();
        assert_eq!(branch_name("Dark Mode", id), "feature/dark-mode");
        assert_eq!(branch_name("!!!", id), format!("feature/mission-{}", id.short()));
    }

    #[test]
    fn mission_with_tasks_links_backlog_tasks() {
        let mut store = store_with(|_| {});
        let id = store.create_mission_with_tasks("Billing", "Invoices", Priority::High, &defs());
        let mission = store.mission(id).unwrap();
        assert_eq!(mission.status, MissionStatus::Planning);
        assert_eq!(mission.task_ids.len(), 2);
        for task_id in &mission.task_ids {
            let task = store.task(*task_id).unwrap();
            assert_eq!(task.status, TaskStatus::Backlog);
            assert_eq!(task.mission_id, Some(id));
        }
        assert_invariants(&store);
    }

    #[test]
    fn start_moves_backlog_to_todo_and_selects() {
        let mut store = store_with(|_| {});
        let id = store.create_mission_with_tasks("Billing", "", Priority::High, &defs());
        store.start_mission(id);
        assert_eq!(store.mission(id).unwrap().status, MissionStatus::Active);
        assert_eq!(store.active_mission(), Some(id));
        assert!(store
            .mission(id)
            .unwrap()
            .task_ids
            .iter()
            .all(|t| store.task(*t).unwrap().status == TaskStatus::Todo));
    }

    #[test]
    fn lifecycle_is_forward_only() {
        let mut store = store_with(|_| {});
        let id = store.create_mission("Search", "", Priority::Medium);
        store.set_mission_status(id, MissionStatus::Review);
        store.set_mission_status(id, MissionStatus::Active);
        assert_eq!(store.mission(id).unwrap().status, MissionStatus::Review);
        let pr = store.mission(id).unwrap().pull_request.clone().unwrap();
        assert_eq!(pr.number, 1);
    }

    #[test]
    fn completion_counts_shipped_and_is_terminal() {
        let mut store = store_with(|_| {});
        let id = store.create_mission("Search", "", Priority::Medium);
        store.start_mission(id);
        store.complete_mission(id);
        assert_eq!(store.stats().features_shipped, 1);
        assert_eq!(store.active_mission(), None);

        store.abandon_mission(id);
        let mission = store.mission(id).unwrap();
        assert_eq!(mission.status, MissionStatus::Completed);
        assert_eq!(store.stats().features_shipped, 1);
    }

    #[test]
    fn abandon_clears_selection() {
        let mut store = store_with(|_| {});
        let id = store.create_mission("Chat", "", Priority::Low);
        store.start_mission(id);
        store.abandon_mission(id);
        assert_eq!(store.mission(id).unwrap().status, MissionStatus::Abandoned);
        assert_eq!(store.active_mission(), None);
        store.start_mission(id);
        assert_eq!(store.mission(id).unwrap().status, MissionStatus::Abandoned);
    }

    #[test]
    fn commits_append_in_order() {
        let mut store = store_with(|_| {});
        let id = store.create_mission("Chat", "", Priority::Low);
        let first = store.record_commit(id, "init", vec!["a.rs".to_owned()]).unwrap();
        let second = store.record_commit(id, "more", Vec::new()).unwrap();
        let ids: Vec<CommitId> = store.mission(id).unwrap().commits.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![first, second]);
        assert!(store.record_commit(MissionId::new(), "lost", Vec::new()).is_none());
    }

    #[test]
    fn task_moves_between_missions() {
        let mut store = store_with(|_| {});
        let a = store.create_mission("A", "", Priority::Low);
        let b = store.create_mission("B", "", Priority::Low);
        let task = store.create_task(&TaskDefinition::new("T", "", TaskType::Bug, 1));
        store.add_task_to_mission(a, task);
        store.add_task_to_mission(a, task);
        assert_eq!(store.mission(a).unwrap().task_ids, vec![task]);

        store.add_task_to_mission(b, task);
        assert!(store.mission(a).unwrap().task_ids.is_empty());
        assert_eq!(store.mission(b).unwrap().task_ids, vec![task]);
        assert_eq!(store.task(task).unwrap().mission_id, Some(b));
    }

    #[tokio::test]
    async fn engineer_work_on_mission_task_records_commit() {
        use crate::generation::ScriptedGenerator;
        use codeshop_types::EmployeeRole;

        let mut store = store_with(|_| {});
        let engineer = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let id = store.create_mission_with_tasks("Billing", "", Priority::High, &defs());
        store.start_mission(id);
        let task = *store.mission(id).unwrap().task_ids.first().unwrap();
        store.assign(task, engineer);

        let request = store.begin_ai_work().unwrap();
        assert!(request.mission_context.as_deref().unwrap().starts_with("Billing"));
        let output = ScriptedGenerator::output_for(&request);
        let _ = store.finish_ai_work(request.work_item_id, Ok(output));

        let commits = &store.mission(id).unwrap().commits;
        assert_eq!(commits.len(), 1);
        let commit = commits.first().unwrap();
        assert_eq!(commit.files.len(), 2);
        assert_eq!(commit.author_id, Some(engineer));
        assert_eq!(commit.task_id, Some(task));
    }
}
