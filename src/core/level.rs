//! Level assignment for diagram layering.
//!
//! `level(t) = 0` when `t` has no prerequisites, otherwise
//! `1 + max(level(p))` over its prerequisites. Computed with an explicit
//! depth-first worklist so deep chains cannot overflow the stack.

use std::collections::HashMap;

use crate::core::task::{Task, TaskId};
use crate::error::{Error, Result};
use crate::plog_trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum VisitState {
    Unvisited,
    InProgress,
    Done(usize),
}

/// Level of every task, in the order the tasks were given.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Levels {
    order: Vec<(TaskId, usize)>,
    index: HashMap<TaskId, usize>,
}

impl Levels {
    pub fn get(&self, id: &TaskId) -> Option<usize> {
        self.index.get(id).map(|&i| self.order[i].1)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Deepest level, or `None` for an empty task set.
    pub fn max_level(&self) -> Option<usize> {
        self.order.iter().map(|&(_, level)| level).max()
    }

    /// `(task, level)` pairs in input order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskId, usize)> + '_ {
        self.order.iter().copied()
    }
}

/// Assign a level to every task.
///
/// Prerequisite ids that do not resolve to a task are ignored. Duplicate
/// task ids keep their first occurrence.
///
/// # Errors
/// Returns `CycleDetected` with the tasks forming the cycle, in dependency
/// order and closed on the first task, if the prerequisites are cyclic.
pub fn assign_levels(tasks: &[Task]) -> Result<Levels> {
    let mut slot: HashMap<TaskId, usize> = HashMap::with_capacity(tasks.len());
    let mut unique: Vec<&Task> = Vec::with_capacity(tasks.len());
    for task in tasks {
        if !slot.contains_key(&task.id) {
            slot.insert(task.id, unique.len());
            unique.push(task);
        }
    }

    let prerequisites: Vec<Vec<usize>> = unique
        .iter()
        .map(|t| {
            t.depends_on_ids
                .iter()
                .filter_map(|p| slot.get(p).copied())
                .collect()
        })
        .collect();

    let mut state = vec![VisitState::Unvisited; unique.len()];
    // (node, next prerequisite to visit)
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..unique.len() {
        if state[root] != VisitState::Unvisited {
            continue;
        }
        stack.push((root, 0));
        state[root] = VisitState::InProgress;

        while let Some(top) = stack.last_mut() {
            let node = top.0;
            if let Some(&next) = prerequisites[node].get(top.1) {
                top.1 += 1;
                match state[next] {
                    VisitState::Unvisited => {
                        state[next] = VisitState::InProgress;
                        stack.push((next, 0));
                    }
                    VisitState::InProgress => {
                        return Err(cycle_error(&stack, next, &unique));
                    }
                    VisitState::Done(_) => {}
                }
                continue;
            }

            let level = prerequisites[node]
                .iter()
                .filter_map(|&p| match state[p] {
                    VisitState::Done(l) => Some(l + 1),
                    _ => None,
                })
                .max()
                .unwrap_or(0);
            state[node] = VisitState::Done(level);
            stack.pop();
        }
    }

    let order: Vec<(TaskId, usize)> = unique
        .iter()
        .zip(&state)
        .map(|(task, s)| match s {
            VisitState::Done(level) => (task.id, *level),
            // every root is driven to completion above
            _ => (task.id, 0),
        })
        .collect();
    let index = order.iter().enumerate().map(|(i, (id, _))| (*id, i)).collect();

    plog_trace!("assign_levels: {} tasks", order.len());
    Ok(Levels { order, index })
}

/// Build the cycle from the DFS stack.
///
/// The stack walks dependent -> prerequisite, so the frames from `closing`
/// to the top are a chain of prerequisites; reversed they read in
/// dependency order.
fn cycle_error(stack: &[(usize, usize)], closing: usize, tasks: &[&Task]) -> Error {
    let start = stack
        .iter()
        .position(|&(node, _)| node == closing)
        .unwrap_or(0);
    let mut ids: Vec<TaskId> = stack[start..]
        .iter()
        .rev()
        .map(|&(node, _)| tasks[node].id)
        .collect();
    if let Some(&first) = ids.first() {
        ids.push(first);
    }
    Error::CycleDetected { tasks: ids }
}
