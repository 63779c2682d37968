//! Commands for the TEA (The Elm Architecture) pattern.
//!
//! Commands are outputs from the update function - they represent side effects
//! to be executed by the runtime.

use crate::core::task::TaskId;
use crate::diagram::SelectionChange;

/// Output commands from the update function.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Collaborator calls (spawn async tasks)
    LoadTasks,
    LoadCritical,
    AddDependency {
        task: TaskId,
        prerequisite: TaskId,
    },
    RemoveDependency {
        task: TaskId,
        prerequisite: TaskId,
    },

    /// Drop the bearer token after the server rejected it.
    ClearSession,

    /// Notify the host that the selected task changed.
    SelectionChanged(SelectionChange),

    // App lifecycle
    Quit,
}
