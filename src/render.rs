use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::core::task::{CpmFields, TaskId};
use crate::diagram::{DrawCommand, Point};
use crate::tea::{Mode, Notification};

/// Selected task as shown in the detail pane.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDetail {
    pub id: TaskId,
    pub title: String,
    pub status: String,
    pub priority: Option<String>,
    pub duration: Option<u32>,
    pub assignee: Option<String>,
    pub due_date: Option<String>,
    pub cpm: CpmFields,
    pub critical: bool,
    pub description: Option<String>,
    pub prerequisites: Vec<String>,
    pub dependents: Vec<String>,
}

/// State of the critical-path fetch, for the header line.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CriticalView {
    #[default]
    Idle,
    Loading,
    /// Path length and summed duration of the critical tasks.
    Ready { tasks: usize, total_duration: u32 },
    /// Path came back empty.
    Empty,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DiagramView {
    #[default]
    Loading,
    NoTasks,
    Ready {
        commands: Arc<[DrawCommand]>,
        zoom: f64,
        /// Diagram-space pan offset.
        pan: Point,
    },
    /// Leveling failed; lists the offending tasks.
    Error {
        message: String,
        tasks: Vec<String>,
    },
    /// Initial fetch failed.
    Failed(String),
}

/// Picker over task candidates (add) or current prerequisites (remove).
#[derive(Debug, Clone, PartialEq)]
pub struct PickerView {
    pub title: String,
    pub items: Vec<String>,
    pub selected: usize,
}

static VERSION_COUNTER: AtomicU64 = AtomicU64::new(0);

pub fn next_version() -> u64 {
    VERSION_COUNTER.fetch_add(1, Ordering::Relaxed)
}

#[derive(Debug, Clone)]
pub struct RenderState {
    pub version: u64,
    pub project: String,
    pub task_count: usize,
    pub authenticated: bool,
    pub diagram: DiagramView,
    pub critical: CriticalView,
    pub detail: Option<TaskDetail>,
    pub mode: Mode,
    pub picker: Option<PickerView>,
    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            version: 0,
            project: String::new(),
            task_count: 0,
            authenticated: false,
            diagram: DiagramView::default(),
            critical: CriticalView::default(),
            detail: None,
            mode: Mode::Diagram,
            picker: None,
            notification: None,
            show_keymap: false,
        }
    }
}
