//! Assignment Matcher: binding employees to tasks and direct status
//! transitions.
//!
//! Both sides of a binding are updated in the same command, so no reader
//! ever sees a task pointing at an employee that does not point back.

use codeshop_types::{Change, EmployeeId, EmployeeStatus, Severity, TaskId, TaskStatus};
use tracing::{debug, info};

use crate::store::EntityStore;

impl EntityStore {
    /// Bind `employee_id` to `task_id` and start the task.
    ///
    /// No-op when either id is unknown. An employee who is busy elsewhere,
    /// or a task that is already done, is rejected with a warning
    /// notification. A previous assignee of the task is released. When
    /// generation is enabled the task is also submitted to the AI work
    /// queue (which ignores tasks already submitted once).
    pub fn assign(&mut self, task_id: TaskId, employee_id: EmployeeId) {
        let (Some(task), Some(employee)) =
            (self.tasks.get(&task_id), self.employees.get(&employee_id))
        else {
            debug!(task_id = %task_id, employee_id = %employee_id, "Assign ignored: unknown id");
            return;
        };

        if task.status == TaskStatus::Done {
            let message = format!("{} is already done", task.title);
            self.notify(message, Severity::Warning);
            return;
        }
        let already_on_task = employee.current_task_id == Some(task_id);
        if employee.status != EmployeeStatus::Idle && !already_on_task {
            let message = format!("{} is not available", employee.name);
            self.notify(message, Severity::Warning);
            return;
        }

        if let Some(previous) = task.assignee_id
            && previous != employee_id
        {
            self.release_employee(previous, task_id);
        }

        if let Some(task) = self.tasks.get_mut(&task_id) {
            task.assignee_id = Some(employee_id);
            task.status = TaskStatus::InProgress;
        }
        if let Some(employee) = self.employees.get_mut(&employee_id) {
            employee.status = EmployeeStatus::Working;
            employee.current_task_id = Some(task_id);
        }
        info!(task_id = %task_id, employee_id = %employee_id, "Task assigned");
        self.emit(Change::TaskAssigned {
            task_id,
            employee_id,
        });

        if self.generation_enabled {
            let _ = self.enqueue_ai_work(task_id, employee_id);
        }
    }

    /// Remove the task's assignee, return the task to `todo`, and free the
    /// employee. No-op when the task is unknown or unassigned.
    pub fn unassign(&mut self, task_id: TaskId) {
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return;
        };
        let Some(employee_id) = task.assignee_id.take() else {
            return;
        };
        task.status = TaskStatus::Todo;
        self.release_employee(employee_id, task_id);
        info!(task_id = %task_id, employee_id = %employee_id, "Task unassigned");
        self.emit(Change::TaskUnassigned { task_id });
        self.emit(Change::TaskStatusChanged {
            task_id,
            status: TaskStatus::Todo,
        });
    }

    /// Set a task's status directly.
    ///
    /// Moving to `done` also frees the assignee and counts the completion
    /// (once per task). Moving out of `done` drops the assignee kept from
    /// before, since that employee may already be working elsewhere. Every
    /// other transition is a plain field write: a task forced back from
    /// `review` does not re-enter the AI queue.
    pub fn update_status(&mut self, task_id: TaskId, status: TaskStatus) {
        let tick = self.clock.tick();
        let Some(task) = self.tasks.get_mut(&task_id) else {
            return;
        };
        let previous = task.status;
        task.status = status;

        if status == TaskStatus::Done && previous != TaskStatus::Done {
            if task.completed_at.is_none() {
                task.completed_at = Some(tick);
            }
            let assignee = task.assignee_id;
            self.stats.tasks_completed = self.stats.tasks_completed.saturating_add(1);
            if let Some(employee_id) = assignee {
                self.release_employee(employee_id, task_id);
                if let Some(employee) = self.employees.get_mut(&employee_id) {
                    employee.tasks_completed = employee.tasks_completed.saturating_add(1);
                }
            }
            info!(task_id = %task_id, "Task done");
        } else if previous == TaskStatus::Done && status != TaskStatus::Done {
            // The assignee kept as history was freed by `done`.
            let stale = task.assignee_id.is_some_and(|id| {
                self.employees
                    .get(&id)
                    .is_none_or(|employee| employee.current_task_id != Some(task_id))
            });
            if stale {
                task.assignee_id = None;
                debug!(task_id = %task_id, "Reopened task left unassigned");
                self.emit(Change::TaskUnassigned { task_id });
            }
        }

        self.emit(Change::TaskStatusChanged { task_id, status });
    }

    /// Free `employee_id` if it is currently bound to `task_id`.
    pub(crate) fn release_employee(&mut self, employee_id: EmployeeId, task_id: TaskId) {
        if let Some(employee) = self.employees.get_mut(&employee_id)
            && employee.current_task_id == Some(task_id)
        {
            employee.current_task_id = None;
            employee.status = EmployeeStatus::Idle;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::{EmployeeRole, TaskDefinition, TaskType};

    use super::*;
    use crate::store::tests::{assert_invariants, store_with};

    fn definition() -> TaskDefinition {
        TaskDefinition::new("Signup", "Signup flow", TaskType::Feature, 5)
    }

    #[test]
    fn assign_binds_both_sides() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, employee);

        let t = store.task(task).unwrap();
        assert_eq!(t.status, TaskStatus::InProgress);
        assert_eq!(t.assignee_id, Some(employee));
        let e = store.employee(employee).unwrap();
        assert_eq!(e.status, EmployeeStatus::Working);
        assert_eq!(e.current_task_id, Some(task));
        assert_invariants(&store);
    }

    #[test]
    fn assign_unknown_ids_is_noop() {
        let mut store = store_with(|_| {});
        let task = store.create_task(&definition());
        store.assign(task, EmployeeId::new());
        assert_eq!(store.task(task).unwrap().status, TaskStatus::Todo);
        store.assign(TaskId::new(), EmployeeId::new());
        assert_eq!(store.notifications().count(), 0);
    }

    #[test]
    fn busy_employee_is_rejected() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let first = store.create_task(&definition());
        let second = store.create_task(&definition());
        store.assign(first, employee);
        store.assign(second, employee);

        assert_eq!(store.task(second).unwrap().status, TaskStatus::Todo);
        assert_eq!(store.employee(employee).unwrap().current_task_id, Some(first));
        let last = store.notifications().last().unwrap();
        assert_eq!(last.severity, Severity::Warning);
        assert_invariants(&store);
    }

    #[test]
    fn reassign_releases_previous_assignee() {
        let mut store = store_with(|_| {});
        let ada = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let bob = store.hire("Bob", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, ada);
        store.assign(task, bob);

        assert_eq!(store.employee(ada).unwrap().status, EmployeeStatus::Idle);
        assert_eq!(store.task(task).unwrap().assignee_id, Some(bob));
        assert_invariants(&store);
    }

    #[test]
    fn unassign_frees_employee() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, employee);
        store.unassign(task);

        assert_eq!(store.task(task).unwrap().status, TaskStatus::Todo);
        assert!(store.task(task).unwrap().assignee_id.is_none());
        assert_eq!(store.employee(employee).unwrap().status, EmployeeStatus::Idle);
        // Unassigning again is a no-op.
        store.unassign(task);
        assert_invariants(&store);
    }

    #[test]
    fn done_frees_assignee_and_counts_once() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, employee);
        store.update_status(task, TaskStatus::Done);
        store.update_status(task, TaskStatus::Done);

        assert_eq!(store.stats().tasks_completed, 1);
        let e = store.employee(employee).unwrap();
        assert_eq!(e.status, EmployeeStatus::Idle);
        assert_eq!(e.tasks_completed, 1);
        // The assignee is kept as history.
        assert_eq!(store.task(task).unwrap().assignee_id, Some(employee));
        assert_invariants(&store);
    }

    #[test]
    fn reopened_task_does_not_hold_its_old_assignee() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let first = store.create_task(&definition());
        let second = store.create_task(&definition());
        store.assign(first, employee);
        store.update_status(first, TaskStatus::Done);
        store.update_status(first, TaskStatus::InProgress);
        store.assign(second, employee);
        let _ = store.tick();

        let reopened = store.task(first).unwrap();
        assert!(reopened.assignee_id.is_none());
        assert_eq!(reopened.progress_ticks, 0);
        assert_eq!(store.task(second).unwrap().progress_ticks, 1);
        assert!(store.invariant_violations().is_empty());
    }

    #[test]
    fn review_back_to_progress_does_not_requeue() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, employee);
        let _ = store.queue.pop_next();
        store.update_status(task, TaskStatus::Review);
        store.update_status(task, TaskStatus::InProgress);

        assert_eq!(store.queue().len(), 0);
        assert!(store.task(task).unwrap().ai_work_started);
    }

    #[test]
    fn generation_disabled_skips_queue() {
        let mut store = store_with(|c| c.queue.generation_enabled = false);
        let employee = store.hire("Ada", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&definition());
        store.assign(task, employee);
        assert_eq!(store.queue().len(), 0);
        assert!(!store.task(task).unwrap().ai_work_started);
    }
}
