//! Employee experience memory and derived specializations.

use std::collections::BTreeMap;

use codeshop_types::{Employee, MemoryRecord};

/// Number of tags promoted to specializations.
pub const MAX_SPECIALIZATIONS: usize = 5;

/// Append `record` to the employee's memory, evict the oldest records past
/// `capacity`, and recompute specializations.
pub fn record_experience(employee: &mut Employee, record: MemoryRecord, capacity: usize) {
    employee.memory.push(record);
    let excess = employee.memory.len().saturating_sub(capacity.max(1));
    if excess > 0 {
        let _ = employee.memory.drain(..excess);
    }
    employee.specializations = derive_specializations(&employee.memory);
}

/// The most frequent tags across `memory`, most frequent first; ties are
/// broken alphabetically.
pub fn derive_specializations(memory: &[MemoryRecord]) -> Vec<String> {
    let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
    for tag in memory.iter().flat_map(|record| record.tags.iter()) {
        let count = counts.entry(tag.as_str()).or_insert(0);
        *count = count.saturating_add(1);
    }
    let mut ranked: Vec<(&str, u32)> = counts.into_iter().collect();
    // BTreeMap iteration is already alphabetical; a stable sort keeps that
    // order among equal counts.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(MAX_SPECIALIZATIONS)
        .map(|(tag, _)| tag.to_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use codeshop_types::{EmployeeId, EmployeeRole, EmployeeStatus, TaskId};
    use rust_decimal::Decimal;

    use super::*;

    fn record(tick: u64, tags: &[&str]) -> MemoryRecord {
        MemoryRecord {
            tick,
            task_id: TaskId::new(),
            summary: format!("tick {tick}"),
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        }
    }

    fn employee() -> Employee {
        Employee {
            id: EmployeeId::new(),
            name: "Ada".to_owned(),
            role: EmployeeRole::Engineer,
            status: EmployeeStatus::Idle,
            current_task_id: None,
            hired_at: 0,
            salary: Decimal::ZERO,
            memory: Vec::new(),
            tasks_completed: 0,
            specializations: Vec::new(),
        }
    }

    #[test]
    fn specializations_rank_by_frequency_then_name() {
        let memory = vec![
            record(1, &["rust", "feature"]),
            record(2, &["rust", "bug"]),
            record(3, &["css", "bug"]),
            record(4, &["rust"]),
        ];
        let specs = derive_specializations(&memory);
        assert_eq!(specs, vec!["rust", "bug", "css", "feature"]);
    }

    #[test]
    fn at_most_five_specializations() {
        let memory = vec![record(1, &["a", "b", "c", "d", "e", "f", "g"])];
        assert_eq!(derive_specializations(&memory).len(), MAX_SPECIALIZATIONS);
    }

    #[test]
    fn memory_is_bounded_oldest_first() {
        let mut e = employee();
        for tick in 0..5 {
            record_experience(&mut e, record(tick, &["rust"]), 3);
        }
        let ticks: Vec<u64> = e.memory.iter().map(|r| r.tick).collect();
        assert_eq!(ticks, vec![2, 3, 4]);
        assert_eq!(e.specializations, vec!["rust"]);
    }
}
