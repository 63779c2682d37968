//! Model for the TEA (The Elm Architecture) pattern.
//!
//! The Model is pure application state - no channels, no handles, no runtime infrastructure.

use crate::core::task::{Task, TaskId};
use crate::diagram::{DiagramError, Drawing, LayoutConfig, PertChart};
use crate::render::{
    next_version, CriticalView, DiagramView, PickerView, RenderState, TaskDetail,
};
use crate::store::TaskSnapshot;

/// Level of a notification message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    /// Error notification - displayed in red with "Error:" prefix
    Error,
    /// Informational notification - displayed in green
    Info,
}

/// A notification message to display to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Application UI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    #[default]
    Diagram,
    Picker(PickerKind),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerKind {
    AddPrerequisite,
    RemovePrerequisite,
}

impl PickerKind {
    pub fn label(&self) -> &'static str {
        match self {
            PickerKind::AddPrerequisite => "Add prerequisite",
            PickerKind::RemovePrerequisite => "Remove prerequisite",
        }
    }
}

/// Open picker: the task being edited and the ids on offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Picker {
    pub kind: PickerKind,
    pub task: TaskId,
    pub options: Vec<TaskId>,
    pub selected: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum CriticalState {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

/// Pure application state - the single source of truth.
pub struct Model {
    pub project: String,
    pub tasks: TaskSnapshot,
    /// Set once the first task fetch has resolved.
    pub loaded: bool,
    pub load_error: Option<String>,
    pub chart: PertChart,
    pub drawing: Result<Drawing, DiagramError>,
    pub critical: CriticalState,

    pub mode: Mode,
    pub picker: Option<Picker>,
    pub notification: Option<Notification>,
    /// Whether the keymap legend is expanded (toggled by '?')
    pub show_keymap: bool,
    pub authenticated: bool,
    pub terminal_size: (u16, u16),

    // Dirty flag - set when state changes and render is needed
    pub dirty: bool,
}

impl Model {
    pub fn new(project: impl Into<String>, layout: LayoutConfig, authenticated: bool) -> Self {
        Self {
            project: project.into(),
            tasks: TaskSnapshot::default(),
            loaded: false,
            load_error: None,
            chart: PertChart::new(layout),
            drawing: Ok(Drawing::default()),
            critical: CriticalState::Idle,
            mode: Mode::default(),
            picker: None,
            notification: None,
            show_keymap: false,
            authenticated,
            terminal_size: (0, 0),
            dirty: true,
        }
    }

    /// Re-run leveling, layout, and rendering after any input to the
    /// diagram changed.
    pub fn redraw(&mut self) {
        self.drawing = self.chart.draw(&self.tasks);
        self.dirty = true;
    }

    pub fn selected_task(&self) -> Option<&Task> {
        self.chart.selected().and_then(|id| self.tasks.get(&id))
    }

    /// Task ids in diagram order (row by row), used for Tab cycling.
    pub fn diagram_order(&self) -> Vec<TaskId> {
        match &self.drawing {
            Ok(drawing) => {
                let mut positions: Vec<_> = drawing.layout.positions().iter().collect();
                positions.sort_by_key(|p| p.level);
                positions.into_iter().map(|p| p.task_id).collect()
            }
            Err(_) => self.tasks.iter().map(|t| t.id).collect(),
        }
    }

    fn title_of(&self, id: &TaskId) -> String {
        match self.tasks.get(id) {
            Some(task) => format!("#{} {}", id.short(), task.title),
            None => format!("#{}", id.short()),
        }
    }

    fn detail(&self) -> Option<TaskDetail> {
        let task = self.selected_task()?;
        let graph = self.tasks.graph();
        let titles = |ids: Vec<TaskId>| -> Vec<String> {
            ids.iter().map(|id| self.title_of(id)).collect()
        };
        let merged = self.chart.overlay().merge_into(std::slice::from_ref(task));
        let cpm = merged.first().map(|t| t.cpm).unwrap_or(task.cpm);

        Some(TaskDetail {
            id: task.id,
            title: task.title.clone(),
            status: task.status.to_string(),
            priority: task.priority.map(|p| p.to_string()),
            duration: task.estimated_duration,
            assignee: task
                .assignee_name
                .clone()
                .or_else(|| task.assignee_id.map(|id| id.to_string())),
            due_date: task.due_date.map(|d| d.to_string()),
            cpm,
            critical: self.chart.overlay().is_critical_task(&task.id),
            description: task.description.clone(),
            prerequisites: titles(graph.prerequisites(&task.id).unwrap_or_default()),
            dependents: titles(graph.dependents(&task.id).unwrap_or_default()),
        })
    }

    fn diagram_view(&self) -> DiagramView {
        if let Some(err) = &self.load_error {
            if !self.loaded {
                return DiagramView::Failed(err.clone());
            }
        }
        if !self.loaded {
            return DiagramView::Loading;
        }
        if self.tasks.is_empty() {
            return DiagramView::NoTasks;
        }
        match &self.drawing {
            Ok(drawing) => DiagramView::Ready {
                commands: drawing.commands.clone().into(),
                zoom: self.chart.viewport().zoom(),
                pan: self.chart.viewport().pan(),
            },
            Err(err) => DiagramView::Error {
                message: err.message.clone(),
                tasks: err.tasks.iter().map(|id| self.title_of(id)).collect(),
            },
        }
    }

    fn critical_view(&self) -> CriticalView {
        match &self.critical {
            CriticalState::Idle => CriticalView::Idle,
            CriticalState::Loading => CriticalView::Loading,
            CriticalState::Failed(msg) => CriticalView::Failed(msg.clone()),
            CriticalState::Ready => {
                let overlay = self.chart.overlay();
                if overlay.path().is_empty() {
                    CriticalView::Empty
                } else {
                    CriticalView::Ready {
                        tasks: overlay.path().len(),
                        total_duration: overlay.total_duration(),
                    }
                }
            }
        }
    }

    fn picker_view(&self) -> Option<PickerView> {
        let picker = self.picker.as_ref()?;
        Some(PickerView {
            title: format!("{} for {}", picker.kind.label(), self.title_of(&picker.task)),
            items: picker.options.iter().map(|id| self.title_of(id)).collect(),
            selected: picker.selected,
        })
    }

    /// Create an immutable snapshot for the render thread.
    ///
    /// Each snapshot gets a monotonically increasing version number so the
    /// render thread can skip redundant renders.
    pub fn snapshot(&self) -> RenderState {
        RenderState {
            version: next_version(),
            project: self.project.clone(),
            task_count: self.tasks.len(),
            authenticated: self.authenticated,
            diagram: self.diagram_view(),
            critical: self.critical_view(),
            detail: self.detail(),
            mode: self.mode,
            picker: self.picker_view(),
            notification: self.notification.clone(),
            show_keymap: self.show_keymap,
        }
    }
}
