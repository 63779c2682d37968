//! Diagram renderer: a pure function from layout and task state to a list
//! of drawing primitives.
//!
//! Coordinates are diagram units multiplied by the zoom factor. Hosts only
//! translate the primitives onto their surface; the terminal UI does this
//! with a ratatui canvas and `pert draw --json` serializes them as-is.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::core::cpm::CriticalOverlay;
use crate::core::task::{Task, TaskId};
use crate::diagram::layout::{DiagramLayout, Rect};

/// Longest title drawn before truncation.
pub const TITLE_MAX_CHARS: usize = 15;
pub const CRITICAL_MARKER: &str = "CRITICAL";

const ARROW_LENGTH: f64 = 10.0;
const ARROW_TIP_GAP: f64 = 5.0;
const TITLE_OFFSET: f64 = 20.0;
const DURATION_OFFSET: f64 = 35.0;
const EARLY_OFFSET: f64 = 50.0;
const LATE_OFFSET: f64 = 65.0;
const MARKER_INSET: f64 = 25.0;
const MARKER_OFFSET: f64 = 12.0;
const TITLE_FONT: f64 = 12.0;
const DETAIL_FONT: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn scaled(self, zoom: f64) -> Self {
        Self::new(self.x * zoom, self.y * zoom)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeStyle {
    Normal,
    Critical,
}

impl EdgeStyle {
    pub fn color(&self) -> &'static str {
        match self {
            EdgeStyle::Normal => "#666666",
            EdgeStyle::Critical => "#f44336",
        }
    }

    pub fn line_width(&self) -> f64 {
        match self {
            EdgeStyle::Normal => 1.0,
            EdgeStyle::Critical => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStyle {
    Normal,
    Critical,
    Selected,
}

impl NodeStyle {
    /// Selection takes precedence over criticality.
    pub fn resolve(selected: bool, critical: bool) -> Self {
        if selected {
            NodeStyle::Selected
        } else if critical {
            NodeStyle::Critical
        } else {
            NodeStyle::Normal
        }
    }

    pub fn fill(&self) -> &'static str {
        match self {
            NodeStyle::Normal => "#f5f5f5",
            NodeStyle::Critical => "#ffebee",
            NodeStyle::Selected => "#e3f2fd",
        }
    }

    pub fn stroke(&self) -> &'static str {
        match self {
            NodeStyle::Normal => "#999999",
            NodeStyle::Critical => "#f44336",
            NodeStyle::Selected => "#2196f3",
        }
    }

    pub fn line_width(&self) -> f64 {
        match self {
            NodeStyle::Normal => 1.0,
            NodeStyle::Critical => 2.0,
            NodeStyle::Selected => 3.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Title,
    Detail,
    Marker,
}

/// One drawing primitive.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        from: Point,
        to: Point,
        style: EdgeStyle,
    },
    /// Two strokes from `tip` to `left` and to `right`.
    Arrowhead {
        tip: Point,
        left: Point,
        right: Point,
        style: EdgeStyle,
    },
    Rect {
        task_id: TaskId,
        rect: Rect,
        style: NodeStyle,
    },
    /// Text centred horizontally on `at`.
    Text {
        at: Point,
        text: String,
        size: f64,
        style: TextStyle,
    },
}

/// Cut a title to `TITLE_MAX_CHARS` characters followed by `...`.
pub fn truncate_label(title: &str) -> String {
    if title.chars().count() > TITLE_MAX_CHARS {
        let head: String = title.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        title.to_string()
    }
}

/// CPM text lines for a node; only fields that are present are shown.
pub fn detail_lines(task: &Task) -> Vec<(f64, String)> {
    let mut lines = Vec::new();
    if let Some(days) = task.estimated_duration.filter(|d| *d > 0) {
        lines.push((DURATION_OFFSET, format!("Duration: {}d", days)));
    }
    if let (Some(es), Some(ef)) = (task.cpm.early_start, task.cpm.early_finish) {
        lines.push((EARLY_OFFSET, format!("ES: {} EF: {}", es, ef)));
    }
    if let (Some(ls), Some(lf)) = (task.cpm.late_start, task.cpm.late_finish) {
        lines.push((LATE_OFFSET, format!("LS: {} LF: {}", ls, lf)));
    }
    lines
}

/// Edge from the prerequisite's right-edge midpoint to the dependent's
/// left-edge midpoint, with the arrow tip just short of the dependent.
fn edge_commands(from: &Rect, to: &Rect, style: EdgeStyle, zoom: f64) -> [DrawCommand; 2] {
    let start = Point::new(from.right(), from.y + from.height / 2.0);
    let end = Point::new(to.x, to.y + to.height / 2.0);
    let angle = (end.y - start.y).atan2(end.x - start.x);
    let tip = Point::new(to.x - ARROW_TIP_GAP, end.y);
    let barb = |offset: f64| {
        Point::new(
            tip.x - ARROW_LENGTH * (angle + offset).cos(),
            tip.y - ARROW_LENGTH * (angle + offset).sin(),
        )
    };
    let sixth = std::f64::consts::PI / 6.0;

    [
        DrawCommand::Line {
            from: start.scaled(zoom),
            to: end.scaled(zoom),
            style,
        },
        DrawCommand::Arrowhead {
            tip: tip.scaled(zoom),
            left: barb(-sixth).scaled(zoom),
            right: barb(sixth).scaled(zoom),
            style,
        },
    ]
}

fn node_commands(task: &Task, rect: &Rect, style: NodeStyle, critical: bool, zoom: f64) -> Vec<DrawCommand> {
    let centre = rect.x + rect.width / 2.0;
    let mut commands = vec![
        DrawCommand::Rect {
            task_id: task.id,
            rect: Rect {
                x: rect.x * zoom,
                y: rect.y * zoom,
                width: rect.width * zoom,
                height: rect.height * zoom,
            },
            style,
        },
        DrawCommand::Text {
            at: Point::new(centre, rect.y + TITLE_OFFSET).scaled(zoom),
            text: truncate_label(&task.title),
            size: TITLE_FONT * zoom,
            style: TextStyle::Title,
        },
    ];

    for (offset, text) in detail_lines(task) {
        commands.push(DrawCommand::Text {
            at: Point::new(centre, rect.y + offset).scaled(zoom),
            text,
            size: DETAIL_FONT * zoom,
            style: TextStyle::Detail,
        });
    }

    if critical {
        commands.push(DrawCommand::Text {
            at: Point::new(rect.right() - MARKER_INSET, rect.y + MARKER_OFFSET).scaled(zoom),
            text: CRITICAL_MARKER.to_string(),
            size: DETAIL_FONT * zoom,
            style: TextStyle::Marker,
        });
    }
    commands
}

/// Produce the draw list: every edge first, then every node.
///
/// Prerequisites missing from the layout are skipped, as are tasks that
/// were not laid out.
pub fn render(
    layout: &DiagramLayout,
    tasks: &[Task],
    overlay: &CriticalOverlay,
    zoom: f64,
    selected: Option<&TaskId>,
) -> Vec<DrawCommand> {
    let by_id: HashMap<TaskId, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let mut commands = Vec::new();

    for position in layout.positions() {
        let Some(task) = by_id.get(&position.task_id) else {
            continue;
        };
        let mut drawn = HashSet::new();
        for prerequisite in &task.depends_on_ids {
            if *prerequisite == task.id || !drawn.insert(*prerequisite) {
                continue;
            }
            let Some(from) = layout.position(prerequisite) else {
                continue;
            };
            let style = if overlay.is_critical_edge(prerequisite, &task.id) {
                EdgeStyle::Critical
            } else {
                EdgeStyle::Normal
            };
            commands.extend(edge_commands(&from.rect, &position.rect, style, zoom));
        }
    }

    for position in layout.positions() {
        let Some(task) = by_id.get(&position.task_id) else {
            continue;
        };
        let critical = overlay.is_critical_task(&task.id);
        let style = NodeStyle::resolve(selected == Some(&task.id), critical);
        commands.extend(node_commands(task, &position.rect, style, critical, zoom));
    }

    commands
}
