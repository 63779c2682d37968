//! Core domain models: tasks, the dependency graph, level assignment, and
//! the critical-path overlay.

pub mod cpm;
pub mod dag;
pub mod level;
pub mod task;

pub use cpm::CriticalOverlay;
pub use dag::{available_candidates, DependencyGraph};
pub use level::{assign_levels, Levels};
pub use task::{CpmFields, Priority, Task, TaskId, TaskStatus};
