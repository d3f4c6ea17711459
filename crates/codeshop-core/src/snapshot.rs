//! Point-in-time copy of the whole store for persistence.
//!
//! A snapshot holds every collection the store owns. Restoring one puts an
//! in-flight work item back in the queue, since the generation call that
//! owned it did not survive the restart.

use chrono::{DateTime, Utc};
use codeshop_types::{
    CompanyStats, Employee, HireIntent, Mission, MissionId, Notification, Proposal, Task,
    Upgrade,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::advisor::AdvisorState;
use crate::clock::SimClock;
use crate::config::CompanyConfig;
use crate::queue::WorkQueue;
use crate::store::EntityStore;
use crate::treasury::Treasury;

/// Layout version written into every snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Errors from [`EntityStore::restore`].
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// The snapshot was written by an incompatible build.
    #[error("unsupported snapshot version {found} (expected {SNAPSHOT_VERSION})")]
    UnsupportedVersion {
        /// Version found in the snapshot.
        found: u32,
    },
}

/// Serializable image of an [`EntityStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Layout version.
    pub version: u32,
    /// Wall-clock time the snapshot was taken.
    pub saved_at: DateTime<Utc>,
    /// Simulation clock.
    pub clock: SimClock,
    /// All tasks.
    pub tasks: Vec<Task>,
    /// All employees.
    pub employees: Vec<Employee>,
    /// All missions.
    pub missions: Vec<Mission>,
    /// Presentation-layer mission selection.
    pub active_mission: Option<MissionId>,
    /// All proposals, decided ones included.
    pub proposals: Vec<Proposal>,
    /// AI work queue.
    pub queue: WorkQueue,
    /// Whether assignment submits generation work.
    pub generation_enabled: bool,
    /// Funds and ledger.
    pub treasury: Treasury,
    /// Upgrade catalog with purchase state.
    pub upgrades: Vec<Upgrade>,
    /// Outstanding hire intents.
    pub hire_intents: Vec<HireIntent>,
    /// Notifications, oldest first.
    pub notifications: Vec<Notification>,
    /// Advisor state.
    pub advisor: AdvisorState,
    /// Company counters.
    pub stats: CompanyStats,
    /// Next pull request number.
    pub next_pull_request: u32,
}

impl EntityStore {
    /// Take a snapshot of the current state. Pending change events are not
    /// included.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            clock: self.clock,
            tasks: self.tasks.values().cloned().collect(),
            employees: self.employees.values().cloned().collect(),
            missions: self.missions.values().cloned().collect(),
            active_mission: self.active_mission,
            proposals: self.proposals.values().cloned().collect(),
            queue: self.queue.clone(),
            generation_enabled: self.generation_enabled,
            treasury: self.treasury.clone(),
            upgrades: self.upgrades.clone(),
            hire_intents: self.hire_intents.clone(),
            notifications: self.notifications.iter().cloned().collect(),
            advisor: self.advisor.clone(),
            stats: self.stats.clone(),
            next_pull_request: self.next_pull_request,
        }
    }

    /// Rebuild a store from `snapshot` under `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::UnsupportedVersion`] if the snapshot layout
    /// does not match this build.
    pub fn restore(config: CompanyConfig, snapshot: StoreSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: snapshot.version,
            });
        }

        let mut store = Self::new(config);
        store.clock = snapshot.clock;
        store.tasks = snapshot.tasks.into_iter().map(|t| (t.id, t)).collect();
        store.employees = snapshot.employees.into_iter().map(|e| (e.id, e)).collect();
        store.missions = snapshot.missions.into_iter().map(|m| (m.id, m)).collect();
        store.active_mission = snapshot.active_mission;
        store.proposals = snapshot.proposals.into_iter().map(|p| (p.id, p)).collect();
        store.queue = snapshot.queue;
        store.queue.restore_in_flight();
        store.generation_enabled = snapshot.generation_enabled;
        store.treasury = snapshot.treasury;
        store.upgrades = snapshot.upgrades;
        store.hire_intents = snapshot.hire_intents;
        store.notifications = snapshot.notifications.into_iter().collect();
        store.advisor = snapshot.advisor;
        store.stats = snapshot.stats;
        store.next_pull_request = snapshot.next_pull_request;

        info!(
            tick = store.clock.tick(),
            tasks = store.tasks.len(),
            employees = store.employees.len(),
            queued = store.queue.len(),
            "Store restored from snapshot"
        );
        Ok(store)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::{EmployeeRole, TaskDefinition, TaskStatus, TaskType};

    use super::*;
    use crate::store::tests::{assert_invariants, store_with};

    #[test]
    fn snapshot_survives_json_and_restores_in_flight_work() {
        let mut store = store_with(|_| {});
        let ada = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&TaskDefinition::new("Login", "", TaskType::Feature, 5));
        store.assign(task, ada);
        let _ = store.tick();
        let request = store.begin_ai_work().unwrap();
        assert!(store.queue().in_flight().is_some());

        let json = serde_json::to_string(&store.snapshot()).unwrap();
        let snapshot: StoreSnapshot = serde_json::from_str(&json).unwrap();
        let restored = EntityStore::restore(store.config().clone(), snapshot).unwrap();

        assert_eq!(restored.current_tick(), 1);
        assert_eq!(restored.task(task).unwrap().status, TaskStatus::InProgress);
        assert_eq!(restored.funds(), store.funds());
        assert!(restored.queue().in_flight().is_none());
        assert_eq!(
            restored.queue().queued().first().map(|i| i.id),
            Some(request.work_item_id)
        );
        assert_invariants(&restored);
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let store = store_with(|_| {});
        let mut snapshot = store.snapshot();
        snapshot.version = 99;
        let err = EntityStore::restore(store.config().clone(), snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::UnsupportedVersion { found: 99 }));
    }
}
