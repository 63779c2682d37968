use thiserror::Error;

use crate::core::task::TaskId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("No home directory")]
    NoHomeDir,

    #[error("Validation error: {0}")]
    Validation(String),

    /// Adding `task -> prerequisite` would close a cycle.
    #[error("Adding dependency on {prerequisite} to {task} would create a cycle")]
    Cycle { task: TaskId, prerequisite: TaskId },

    /// A cycle was found while leveling the graph.
    #[error("Cycle detected between tasks: {}", format_ids(.tasks))]
    CycleDetected { tasks: Vec<TaskId> },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Session expired or missing token")]
    Unauthorized,

    #[error("Operation timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Task join error: {0}")]
    TaskJoin(String),
}

impl Error {
    /// Errors caused by the remote collaborator rather than local state.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Error::Http(_)
                | Error::Network(_)
                | Error::Status { .. }
                | Error::Timeout(_)
                | Error::Unauthorized
        )
    }
}

fn format_ids(ids: &[TaskId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

pub type Result<T> = std::result::Result<T, Error>;
