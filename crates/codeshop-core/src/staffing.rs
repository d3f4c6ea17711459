//! Hiring and firing.

use codeshop_types::{
    Change, Employee, EmployeeId, EmployeeRole, EmployeeStatus, LedgerEntryKind, Severity,
    TaskStatus,
};
use tracing::{info, warn};

use crate::store::EntityStore;

impl EntityStore {
    /// Hire an employee, paying the role's salary from the funds pool.
    ///
    /// With insufficient funds nothing changes and an error notification is
    /// raised. A matching pending hire intent is consumed on success.
    pub fn hire(&mut self, name: &str, role: EmployeeRole) -> Option<EmployeeId> {
        let cost = self.config.economy.salaries.for_role(role);
        let tick = self.clock.tick();
        let name = if name.trim().is_empty() {
            format!("{} #{}", role.as_str(), self.employees.len().saturating_add(1))
        } else {
            name.trim().to_owned()
        };

        if let Err(err) =
            self.treasury
                .spend(cost, LedgerEntryKind::Hire, format!("Hired {name} ({})", role.as_str()), tick)
        {
            warn!(role = role.as_str(), error = %err, "Hire rejected");
            self.notify(
                format!(
                    "Cannot hire a {}: costs {cost}, have {}",
                    role.as_str(),
                    self.treasury.funds()
                ),
                Severity::Error,
            );
            return None;
        }

        let employee = Employee {
            id: EmployeeId::new(),
            name,
            role,
            status: EmployeeStatus::Idle,
            current_task_id: None,
            hired_at: tick,
            salary: cost,
            memory: Vec::new(),
            tasks_completed: 0,
            specializations: Vec::new(),
        };
        let employee_id = employee.id;
        info!(employee_id = %employee_id, name = %employee.name, role = role.as_str(), "Employee hired");
        let message = format!("Hired {} as {}", employee.name, role.as_str());
        self.employees.insert(employee_id, employee);

        if let Some(pos) = self.hire_intents.iter().position(|i| i.role == role) {
            let _ = self.hire_intents.remove(pos);
        }

        self.emit(Change::EmployeeHired { employee_id, role });
        self.notify(message, Severity::Success);
        Some(employee_id)
    }

    /// Fire an employee. No-op for unknown ids.
    ///
    /// Their current task goes back to `todo` unassigned. Their queued (not
    /// in-flight) AI work items are discarded and the affected tasks become
    /// eligible for generation again, since no generation ever ran.
    pub fn fire(&mut self, employee_id: EmployeeId) {
        let Some(employee) = self.employees.remove(&employee_id) else {
            return;
        };

        if let Some(task_id) = employee.current_task_id
            && let Some(task) = self.tasks.get_mut(&task_id)
            && task.assignee_id == Some(employee_id)
        {
            task.assignee_id = None;
            if task.status == TaskStatus::InProgress {
                task.status = TaskStatus::Todo;
            }
            self.emit(Change::TaskUnassigned { task_id });
        }

        let discarded = self.queue.remove_queued_for_employee(employee_id);
        for item in &discarded {
            if let Some(task) = self.tasks.get_mut(&item.task_id) {
                task.ai_work_started = false;
            }
        }

        info!(
            employee_id = %employee_id,
            discarded_work = discarded.len(),
            "Employee fired"
        );
        self.emit(Change::EmployeeFired { employee_id });
        self.notify(format!("{} left the company", employee.name), Severity::Info);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use codeshop_types::{TaskDefinition, TaskType};
    use rust_decimal::Decimal;

    use super::*;
    use crate::config::CompanyConfig;
    use crate::store::tests::{assert_invariants, store_with};

    #[test]
    fn hire_deducts_salary() {
        let mut store = EntityStore::new(CompanyConfig::default());
        let id = store.hire("Grace", EmployeeRole::Engineer).unwrap();
        assert_eq!(store.funds(), Decimal::new(7_000, 0));
        let employee = store.employee(id).unwrap();
        assert_eq!(employee.status, EmployeeStatus::Idle);
        assert_eq!(employee.salary, Decimal::new(3_000, 0));
        assert_eq!(store.ledger().len(), 2);
    }

    #[test]
    fn hire_without_funds_is_rejected() {
        let mut store = store_with(|c| c.economy.starting_funds = Decimal::new(1_000, 0));
        let result = store.hire("Grace", EmployeeRole::Engineer);
        assert!(result.is_none());
        assert_eq!(store.employees().count(), 0);
        assert_eq!(store.funds(), Decimal::new(1_000, 0));
        let last = store.notifications().last().unwrap();
        assert_eq!(last.severity, Severity::Error);
    }

    #[test]
    fn blank_name_gets_role_label() {
        let mut store = store_with(|_| {});
        let id = store.hire("  ", EmployeeRole::Designer).unwrap();
        assert_eq!(store.employee(id).unwrap().name, "designer #1");
    }

    #[test]
    fn fire_returns_task_to_todo() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Linus", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&TaskDefinition::new("Kernel", "", TaskType::Feature, 5));
        store.assign(task, employee);
        let _ = store.tick();

        store.fire(employee);
        assert!(store.employee(employee).is_none());
        let task = store.task(task).unwrap();
        assert_eq!(task.status, TaskStatus::Todo);
        assert!(task.assignee_id.is_none());
        assert_invariants(&store);
    }

    #[test]
    fn fire_discards_queued_work() {
        let mut store = store_with(|_| {});
        let employee = store.hire("Linus", EmployeeRole::Engineer).unwrap();
        let task = store.create_task(&TaskDefinition::new("Kernel", "", TaskType::Feature, 5));
        store.assign(task, employee);
        assert_eq!(store.queue().len(), 1);
        assert!(store.task(task).unwrap().ai_work_started);

        store.fire(employee);
        assert_eq!(store.queue().len(), 0);
        assert!(!store.task(task).unwrap().ai_work_started);
    }

    #[test]
    fn fire_unknown_is_noop() {
        let mut store = store_with(|_| {});
        store.fire(EmployeeId::new());
        assert_eq!(store.notifications().count(), 0);
    }
}
