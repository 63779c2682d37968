//! Remote collaborator: the project API that owns tasks, persists
//! dependency edges, and runs the critical-path computation.

pub mod http;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::task::{Task, TaskId};
use crate::Result;

pub use http::HttpCollaborator;

/// Identifier of a project, used verbatim as a URL path segment.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Operations the diagram engine consumes from the remote API.
#[async_trait]
pub trait Collaborator: Send + Sync {
    /// Tasks of a project, in the server's order.
    async fn tasks_for_project(&self, project: &ProjectId) -> Result<Vec<Task>>;

    /// Ordered task ids on the critical path.
    async fn critical_path(&self, project: &ProjectId) -> Result<Vec<TaskId>>;

    /// Critical tasks with CPM fields populated.
    async fn critical_tasks(&self, project: &ProjectId) -> Result<Vec<Task>>;

    /// Persist `task` depending on `prerequisite`; returns the updated task.
    async fn add_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task>;

    /// Delete the edge; returns the updated task.
    async fn remove_dependency(&self, task: &TaskId, prerequisite: &TaskId) -> Result<Task>;
}
