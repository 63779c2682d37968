//! Dependency graph over a task snapshot.
//!
//! Edges point from a prerequisite to its dependent: `A -> B` means B
//! cannot start before A completes. The graph is rebuilt from each task
//! snapshot and never mutated in place, so it can be thrown away freely.

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use crate::{plog_debug, plog_warn};
use petgraph::algo::has_path_connecting;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef};
use petgraph::Direction;
use std::collections::{HashMap, HashSet};

/// Read-only dependency graph built from a task list.
pub struct DependencyGraph {
    /// Nodes are task ids in snapshot order; node indices follow that order.
    graph: DiGraph<TaskId, ()>,
    task_index: HashMap<TaskId, NodeIndex>,
}

impl DependencyGraph {
    /// Build the graph from a task snapshot.
    ///
    /// Prerequisite ids that do not name a task in the snapshot are skipped,
    /// as are self references and duplicate edges.
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let mut graph = DiGraph::with_capacity(tasks.len(), tasks.len());
        let mut task_index = HashMap::with_capacity(tasks.len());

        for task in tasks {
            if task_index.contains_key(&task.id) {
                plog_warn!("DependencyGraph: duplicate task id {}", task.id);
                continue;
            }
            let index = graph.add_node(task.id);
            task_index.insert(task.id, index);
        }

        for task in tasks {
            let to = task_index[&task.id];
            for prerequisite in &task.depends_on_ids {
                if *prerequisite == task.id {
                    plog_warn!("DependencyGraph: task {} depends on itself", task.id);
                    continue;
                }
                let Some(&from) = task_index.get(prerequisite) else {
                    plog_debug!(
                        "DependencyGraph: task {} references unknown prerequisite {}",
                        task.id,
                        prerequisite
                    );
                    continue;
                };
                graph.update_edge(from, to, ());
            }
        }

        Self { graph, task_index }
    }

    pub fn task_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn dependency_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn contains_task(&self, id: &TaskId) -> bool {
        self.task_index.contains_key(id)
    }

    fn node(&self, id: &TaskId) -> Result<NodeIndex> {
        self.task_index
            .get(id)
            .copied()
            .ok_or_else(|| Error::NotFound(format!("Task {}", id)))
    }

    /// Check whether `task` directly depends on `prerequisite`.
    pub fn has_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> bool {
        match (self.task_index.get(prerequisite), self.task_index.get(task)) {
            (Some(&from), Some(&to)) => self.graph.find_edge(from, to).is_some(),
            _ => false,
        }
    }

    fn neighbors_sorted(&self, index: NodeIndex, dir: Direction) -> Vec<TaskId> {
        let mut nodes: Vec<NodeIndex> = self.graph.neighbors_directed(index, dir).collect();
        nodes.sort();
        nodes.into_iter().map(|n| self.graph[n]).collect()
    }

    /// Direct prerequisites of a task, in snapshot order.
    pub fn prerequisites(&self, id: &TaskId) -> Result<Vec<TaskId>> {
        let index = self.node(id)?;
        Ok(self.neighbors_sorted(index, Direction::Incoming))
    }

    /// Tasks that directly depend on `id`, in snapshot order.
    pub fn dependents(&self, id: &TaskId) -> Result<Vec<TaskId>> {
        let index = self.node(id)?;
        Ok(self.neighbors_sorted(index, Direction::Outgoing))
    }

    /// Every task that depends on `id` directly or transitively.
    pub fn transitive_dependents(&self, id: &TaskId) -> Result<HashSet<TaskId>> {
        let start = self.node(id)?;
        let mut found = HashSet::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(node) = dfs.next(&self.graph) {
            if node != start {
                found.insert(self.graph[node]);
            }
        }
        Ok(found)
    }

    /// Would adding the edge `prerequisite -> task` close a cycle?
    ///
    /// True when the prerequisite is already reachable from the task,
    /// i.e. it transitively depends on the task.
    pub fn would_create_cycle(&self, task: &TaskId, prerequisite: &TaskId) -> Result<bool> {
        let task_node = self.node(task)?;
        let prerequisite_node = self.node(prerequisite)?;
        Ok(has_path_connecting(&self.graph, task_node, prerequisite_node, None))
    }

    /// Validate a new edge before it is sent to the server.
    pub fn check_new_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<()> {
        if task == prerequisite {
            return Err(Error::Validation(format!(
                "Task {} cannot depend on itself",
                task
            )));
        }
        if self.would_create_cycle(task, prerequisite)? {
            return Err(Error::Cycle {
                task: *task,
                prerequisite: *prerequisite,
            });
        }
        Ok(())
    }

    /// All edges as `(prerequisite, dependent)` pairs.
    pub fn edges(&self) -> Vec<(TaskId, TaskId)> {
        self.graph
            .edge_references()
            .map(|edge| (self.graph[edge.source()], self.graph[edge.target()]))
            .collect()
    }

    /// Tasks with no prerequisites.
    pub fn sources(&self) -> Vec<TaskId> {
        self.graph
            .node_indices()
            .filter(|&n| {
                self.graph
                    .neighbors_directed(n, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|n| self.graph[n])
            .collect()
    }
}

impl std::fmt::Debug for DependencyGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DependencyGraph")
            .field("tasks", &self.task_count())
            .field("dependencies", &self.dependency_count())
            .finish()
    }
}

/// Tasks that may be added as a new prerequisite of `task_id`.
///
/// Excludes the task itself, its current direct prerequisites, and every
/// task that already depends on it directly or transitively.
pub fn available_candidates<'a>(task_id: &TaskId, all_tasks: &'a [Task]) -> Result<Vec<&'a Task>> {
    let graph = DependencyGraph::from_tasks(all_tasks);
    let direct: HashSet<TaskId> = graph.prerequisites(task_id)?.into_iter().collect();
    let downstream = graph.transitive_dependents(task_id)?;

    Ok(all_tasks
        .iter()
        .filter(|t| t.id != *task_id && !direct.contains(&t.id) && !downstream.contains(&t.id))
        .collect())
}
