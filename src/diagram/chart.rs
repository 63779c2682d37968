//! PERT chart state for a host surface: viewport, selection, and the
//! critical overlay, plus the leveling → layout → render pipeline.

use crate::core::cpm::CriticalOverlay;
use crate::core::level::assign_levels;
use crate::core::task::{Task, TaskId};
use crate::diagram::draw::{render, DrawCommand, Point};
use crate::diagram::layout::{layout, DiagramLayout, LayoutConfig};
use crate::diagram::viewport::Viewport;
use crate::{plog_debug, plog_warn, Error};

/// Why a diagram could not be drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct DiagramError {
    pub message: String,
    /// Tasks involved, e.g. the members of a dependency cycle.
    pub tasks: Vec<TaskId>,
}

impl From<Error> for DiagramError {
    fn from(e: Error) -> Self {
        let tasks = match &e {
            Error::CycleDetected { tasks } => tasks.clone(),
            Error::Cycle { task, prerequisite } => vec![*task, *prerequisite],
            _ => Vec::new(),
        };
        Self {
            message: e.to_string(),
            tasks,
        }
    }
}

/// Emitted when a click changes the selected task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChange {
    pub previous: Option<TaskId>,
    pub current: Option<TaskId>,
}

/// Drawn diagram: layout for hit testing plus the draw list.
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    pub layout: DiagramLayout,
    pub commands: Vec<DrawCommand>,
}

#[derive(Debug, Clone, Default)]
pub struct PertChart {
    config: LayoutConfig,
    viewport: Viewport,
    overlay: CriticalOverlay,
    selected: Option<TaskId>,
}

impl PertChart {
    pub fn new(config: LayoutConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn viewport_mut(&mut self) -> &mut Viewport {
        &mut self.viewport
    }

    pub fn overlay(&self) -> &CriticalOverlay {
        &self.overlay
    }

    pub fn set_overlay(&mut self, overlay: CriticalOverlay) {
        self.overlay = overlay;
    }

    pub fn clear_overlay(&mut self) {
        self.overlay = CriticalOverlay::default();
    }

    pub fn selected(&self) -> Option<TaskId> {
        self.selected
    }

    /// Change the selection; returns the event when it actually changed.
    pub fn select(&mut self, task: Option<TaskId>) -> Option<SelectionChange> {
        if self.selected == task {
            return None;
        }
        let change = SelectionChange {
            previous: self.selected,
            current: task,
        };
        self.selected = task;
        Some(change)
    }

    /// Level, lay out, and render `tasks` with the current overlay, zoom,
    /// and selection.
    pub fn draw(&self, tasks: &[Task]) -> Result<Drawing, DiagramError> {
        let levels = assign_levels(tasks).map_err(|e| {
            plog_warn!("PertChart::draw: {}", e);
            DiagramError::from(e)
        })?;
        let tasks = self.overlay.merge_into(tasks);
        let layout = layout(&tasks, &levels, &self.config);
        let commands = render(
            &layout,
            &tasks,
            &self.overlay,
            self.viewport.zoom(),
            self.selected.as_ref(),
        );
        plog_debug!(
            "PertChart::draw: {} tasks, {} levels, {} commands",
            tasks.len(),
            levels.max_level().map_or(0, |l| l + 1),
            commands.len()
        );
        Ok(Drawing { layout, commands })
    }

    /// Hit-test a pointer against the layout of `tasks`; clicking empty
    /// space clears the selection.
    pub fn click(&mut self, pointer: Point, origin: Point, tasks: &[Task]) -> Option<SelectionChange> {
        let levels = match assign_levels(tasks) {
            Ok(levels) => levels,
            Err(e) => {
                plog_debug!("PertChart::click ignored: {}", e);
                return None;
            }
        };
        let layout = layout(tasks, &levels, &self.config);
        let point = self.viewport.to_diagram(pointer, origin);
        let hit = self.viewport.hit_test(&layout, point);
        self.select(hit)
    }
}
