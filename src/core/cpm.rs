//! Critical-path overlay.
//!
//! The remote scheduler owns the CPM computation; this module only holds
//! its result and merges the CPM fields onto the local task snapshot.

use std::collections::{HashMap, HashSet};

use crate::core::task::{CpmFields, Task, TaskId};
use crate::plog_warn;

/// Server-computed critical path and critical task set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CriticalOverlay {
    path: Vec<TaskId>,
    critical: HashSet<TaskId>,
    /// Consecutive `(prerequisite, dependent)` pairs along the path.
    links: HashSet<(TaskId, TaskId)>,
    cpm: HashMap<TaskId, CpmFields>,
    total_duration: u32,
}

impl CriticalOverlay {
    pub fn new(path: Vec<TaskId>, critical_tasks: &[Task]) -> Self {
        let links = path.windows(2).map(|w| (w[0], w[1])).collect();
        let critical = critical_tasks.iter().map(|t| t.id).collect();
        let cpm = critical_tasks
            .iter()
            .filter(|t| !t.cpm.is_empty())
            .map(|t| (t.id, t.cpm))
            .collect();
        let total_duration = critical_tasks
            .iter()
            .map(|t| t.estimated_duration.unwrap_or(0))
            .sum();

        Self {
            path,
            critical,
            links,
            cpm,
            total_duration,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.path.is_empty() && self.critical.is_empty()
    }

    /// Ordered task ids on the critical path.
    pub fn path(&self) -> &[TaskId] {
        &self.path
    }

    pub fn critical_count(&self) -> usize {
        self.critical.len()
    }

    /// Sum of estimated durations over the critical task set, in days.
    pub fn total_duration(&self) -> u32 {
        self.total_duration
    }

    pub fn is_critical_task(&self, id: &TaskId) -> bool {
        self.critical.contains(id)
    }

    pub fn on_path(&self, id: &TaskId) -> bool {
        self.path.contains(id)
    }

    /// An edge is critical only when both ends are critical tasks and the
    /// prerequisite immediately precedes the dependent on the critical path.
    /// Two critical tasks joined by an edge that the path does not traverse
    /// stay unhighlighted.
    pub fn is_critical_edge(&self, prerequisite: &TaskId, dependent: &TaskId) -> bool {
        self.links.contains(&(*prerequisite, *dependent))
            && self.critical.contains(prerequisite)
            && self.critical.contains(dependent)
    }

    /// Copy CPM fields onto a fresh task list; fields already present on a
    /// task are kept.
    pub fn merge_into(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                if let Some(fields) = self.cpm.get(&task.id) {
                    task.cpm.fill_from(fields);
                }
                if !task.cpm.is_empty() && !task.cpm_consistent() {
                    plog_warn!("Task {} has inconsistent CPM fields: {:?}", task.id, task.cpm);
                }
                task
            })
            .collect()
    }
}
