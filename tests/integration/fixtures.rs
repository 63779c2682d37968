//! Test fixtures for integration tests.
//!
//! Provides helpers for:
//! - An in-memory collaborator that behaves like the project API
//! - Predefined task sets

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use pert::api::{Collaborator, ProjectId};
use pert::core::{Task, TaskId};
use pert::store::DependencyStore;
use pert::{Error, Result};

pub fn id(n: i64) -> TaskId {
    TaskId::Int(n)
}

pub fn task(n: i64, title: &str, duration: u32, deps: &[i64]) -> Task {
    let deps: Vec<TaskId> = deps.iter().map(|&d| id(d)).collect();
    Task::new(n, title)
        .with_duration(duration)
        .with_dependencies(&deps)
}

/// A -> B -> D, A -> C -> D
pub fn diamond() -> Vec<Task> {
    vec![
        task(1, "A", 2, &[]),
        task(2, "B", 3, &[1]),
        task(3, "C", 1, &[1]),
        task(4, "D", 4, &[2, 3]),
    ]
}

/// Calls made against the mock, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Tasks,
    CriticalPath,
    CriticalTasks,
    Add(TaskId, TaskId),
    Remove(TaskId, TaskId),
}

#[derive(Default)]
struct MockState {
    tasks: Vec<Task>,
    critical_path: Vec<TaskId>,
    critical_tasks: Vec<Task>,
    calls: Vec<Call>,
    reject_with_status: Option<u16>,
}

/// In-memory project API. Edges added through it are persisted in its own
/// task list, like the real server.
#[derive(Clone, Default)]
pub struct MockCollaborator {
    state: Arc<Mutex<MockState>>,
}

impl MockCollaborator {
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let mock = Self::default();
        mock.state.lock().unwrap().tasks = tasks;
        mock
    }

    pub fn set_critical(&self, path: &[i64], tasks: Vec<Task>) {
        let mut state = self.state.lock().unwrap();
        state.critical_path = path.iter().map(|&n| id(n)).collect();
        state.critical_tasks = tasks;
    }

    /// Make every subsequent call fail with this HTTP status.
    pub fn reject_with(&self, status: u16) {
        self.state.lock().unwrap().reject_with_status = Some(status);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Server-side edits that bypass the store, as another client would.
    pub fn server_edit(&self, f: impl FnOnce(&mut Vec<Task>)) {
        f(&mut self.state.lock().unwrap().tasks);
    }

    fn record(&self, call: Call) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        match state.reject_with_status {
            Some(401) => Err(Error::Unauthorized),
            Some(404) => Err(Error::NotFound("mock".into())),
            Some(status) => Err(Error::Status {
                status,
                message: "rejected".into(),
            }),
            None => Ok(()),
        }
    }

    fn edit_task(&self, task: &TaskId, f: impl FnOnce(&mut Task)) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        let found = state
            .tasks
            .iter_mut()
            .find(|t| t.id == *task)
            .ok_or_else(|| Error::NotFound(format!("task {}", task)))?;
        f(found);
        Ok(found.clone())
    }
}

#[async_trait]
impl Collaborator for MockCollaborator {
    async fn tasks_for_project(&self, _project: &ProjectId) -> Result<Vec<Task>> {
        self.record(Call::Tasks)?;
        Ok(self.state.lock().unwrap().tasks.clone())
    }

    async fn critical_path(&self, _project: &ProjectId) -> Result<Vec<TaskId>> {
        self.record(Call::CriticalPath)?;
        Ok(self.state.lock().unwrap().critical_path.clone())
    }

    async fn critical_tasks(&self, _project: &ProjectId) -> Result<Vec<Task>> {
        self.record(Call::CriticalTasks)?;
        Ok(self.state.lock().unwrap().critical_tasks.clone())
    }

    async fn add_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        self.record(Call::Add(*task, *prerequisite))?;
        let prerequisite = *prerequisite;
        self.edit_task(task, |t| {
            if !t.depends_on_ids.contains(&prerequisite) {
                t.depends_on_ids.push(prerequisite);
            }
        })
    }

    async fn remove_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task> {
        self.record(Call::Remove(*task, *prerequisite))?;
        let prerequisite = *prerequisite;
        self.edit_task(task, |t| t.depends_on_ids.retain(|p| *p != prerequisite))
    }
}

/// A store over the mock, already refreshed.
pub async fn loaded_store(tasks: Vec<Task>) -> (Arc<DependencyStore>, MockCollaborator) {
    let mock = MockCollaborator::with_tasks(tasks);
    let store = Arc::new(DependencyStore::new(
        Arc::new(mock.clone()),
        ProjectId::new("7"),
    ));
    store.refresh().await.expect("initial refresh");
    (store, mock)
}
