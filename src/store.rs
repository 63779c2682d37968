//! Dependency store: the authoritative task snapshot for one project and
//! the add/remove/query operations on its dependency edges.
//!
//! The snapshot is an immutable `Arc<[Task]>` swapped wholesale after every
//! successful refresh or mutation, so readers always see a complete
//! before-or-after view. Rejected mutations leave it untouched.

use std::ops::Deref;
use std::sync::{Arc, RwLock};

use crate::api::{Collaborator, ProjectId};
use crate::core::cpm::CriticalOverlay;
use crate::core::dag::{available_candidates, DependencyGraph};
use crate::core::task::{Task, TaskId};
use crate::{plog, plog_debug, plog_warn, Error, Result};

/// Immutable list of tasks in server order.
#[derive(Debug, Clone, Default)]
pub struct TaskSnapshot(Arc<[Task]>);

impl TaskSnapshot {
    pub fn new(tasks: Vec<Task>) -> Self {
        Self(tasks.into())
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.0.iter().find(|t| t.id == *id)
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.get(id).is_some()
    }

    /// A new snapshot with `task` replacing the entry of the same id, or
    /// appended when it is new.
    pub fn with_task(&self, task: Task) -> Self {
        let mut tasks = self.0.to_vec();
        match tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => *slot = task,
            None => tasks.push(task),
        }
        Self::new(tasks)
    }

    pub fn graph(&self) -> DependencyGraph {
        DependencyGraph::from_tasks(&self.0)
    }

    fn require(&self, id: &TaskId) -> Result<&Task> {
        self.get(id)
            .ok_or_else(|| Error::NotFound(format!("Task {}", id)))
    }

    fn collect(&self, ids: &[TaskId]) -> Vec<Task> {
        ids.iter().filter_map(|id| self.get(id)).cloned().collect()
    }
}

impl Deref for TaskSnapshot {
    type Target = [Task];

    fn deref(&self) -> &[Task] {
        &self.0
    }
}

/// Dependency bookkeeping for a project, backed by the remote collaborator.
pub struct DependencyStore {
    client: Arc<dyn Collaborator>,
    project: ProjectId,
    snapshot: RwLock<TaskSnapshot>,
}

impl DependencyStore {
    pub fn new(client: Arc<dyn Collaborator>, project: ProjectId) -> Self {
        Self {
            client,
            project,
            snapshot: RwLock::new(TaskSnapshot::default()),
        }
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }

    /// Current snapshot (cheap clone of the shared list).
    pub fn snapshot(&self) -> TaskSnapshot {
        match self.snapshot.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    fn replace(&self, next: TaskSnapshot) {
        match self.snapshot.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Adopt an externally loaded task list.
    pub fn set_tasks(&self, tasks: Vec<Task>) -> TaskSnapshot {
        let next = TaskSnapshot::new(tasks);
        self.replace(next.clone());
        next
    }

    /// Fetch the project's tasks and adopt them as the new snapshot.
    ///
    /// Whichever refresh resolves last wins.
    pub async fn refresh(&self) -> Result<TaskSnapshot> {
        let tasks = self.client.tasks_for_project(&self.project).await?;
        for task in &tasks {
            if let Err(e) = task.validate() {
                plog_warn!("refresh: {}", e);
            }
        }
        plog!("Loaded {} tasks for project {}", tasks.len(), self.project);
        Ok(self.set_tasks(tasks))
    }

    /// Fetch the critical path and the critical task set concurrently.
    pub async fn critical_overlay(&self) -> Result<CriticalOverlay> {
        let (path, critical) = futures::future::try_join(
            self.client.critical_path(&self.project),
            self.client.critical_tasks(&self.project),
        )
        .await?;
        plog_debug!(
            "critical_overlay: path={} critical={}",
            path.len(),
            critical.len()
        );
        Ok(CriticalOverlay::new(path, &critical))
    }

    /// Make `task` depend on `prerequisite`.
    ///
    /// # Errors
    /// - `Validation` when both ids are the same task
    /// - `NotFound` when either task is not in the snapshot
    /// - `Cycle` when the prerequisite already depends on the task
    /// - collaborator errors, including the server's own cycle rejection
    pub async fn add_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        let snapshot = self.snapshot();
        if task == prerequisite {
            return Err(Error::Validation(format!(
                "Task {} cannot depend on itself",
                task
            )));
        }
        let current = snapshot.require(task)?;
        snapshot.require(prerequisite)?;
        if current.depends_on(prerequisite) {
            plog_debug!("add_dependency: {} already depends on {}", task, prerequisite);
            return Ok(current.clone());
        }
        snapshot.graph().check_new_dependency(task, prerequisite)?;

        let updated = self.client.add_dependency(task, prerequisite).await?;
        plog!("Dependency added: {} depends on {}", task, prerequisite);
        self.replace(self.snapshot().with_task(updated.clone()));
        Ok(updated)
    }

    /// Remove the edge if present. Removing a missing edge is not an error.
    pub async fn remove_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        let snapshot = self.snapshot();
        let current = snapshot.require(task)?;
        if !current.depends_on(prerequisite) {
            plog_debug!("remove_dependency: {} has no edge to {}", task, prerequisite);
            return Ok(current.clone());
        }

        let updated = match self.client.remove_dependency(task, prerequisite).await {
            Ok(updated) => updated,
            Err(Error::NotFound(msg)) => {
                plog_debug!("remove_dependency: server has no such edge ({})", msg);
                let mut local = current.clone();
                local.depends_on_ids.retain(|p| p != prerequisite);
                local
            }
            Err(e) => return Err(e),
        };
        plog!("Dependency removed: {} no longer depends on {}", task, prerequisite);
        self.replace(self.snapshot().with_task(updated.clone()));
        Ok(updated)
    }

    /// Direct prerequisites of a task.
    pub fn list_dependencies(&self, task: &TaskId) -> Result<Vec<Task>> {
        let snapshot = self.snapshot();
        let ids = snapshot.graph().prerequisites(task)?;
        Ok(snapshot.collect(&ids))
    }

    /// Tasks that directly depend on `task`.
    pub fn list_dependents(&self, task: &TaskId) -> Result<Vec<Task>> {
        let snapshot = self.snapshot();
        let ids = snapshot.graph().dependents(task)?;
        Ok(snapshot.collect(&ids))
    }

    /// Tasks that can become a new prerequisite without creating a cycle.
    pub fn available_candidates(&self, task: &TaskId) -> Result<Vec<Task>> {
        let snapshot = self.snapshot();
        Ok(available_candidates(task, &snapshot)?
            .into_iter()
            .cloned()
            .collect())
    }
}
