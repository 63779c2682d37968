//! Layered placement of task boxes.
//!
//! Tasks are grouped by level; each level is a row, rows run top to bottom,
//! and tasks within a row keep the input order from left to right.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::core::level::Levels;
use crate::core::task::{Task, TaskId};
use crate::{Error, Result};

/// Box sizes and spacings, in diagram units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub node_width: f64,
    pub node_height: f64,
    /// Horizontal gap between boxes in the same row.
    pub node_spacing: f64,
    /// Vertical gap between rows.
    pub level_spacing: f64,
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_width: 150.0,
            node_height: 80.0,
            node_spacing: 100.0,
            level_spacing: 120.0,
            margin: 50.0,
        }
    }
}

impl LayoutConfig {
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("node_width", self.node_width),
            ("node_height", self.node_height),
            ("node_spacing", self.node_spacing),
            ("level_spacing", self.level_spacing),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(Error::Validation(format!(
                    "layout.{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if !(self.margin.is_finite() && self.margin >= 0.0) {
            return Err(Error::Validation(format!(
                "layout.margin must not be negative, got {}",
                self.margin
            )));
        }
        Ok(())
    }

    /// Horizontal distance between the left edges of neighbouring boxes.
    pub fn column_pitch(&self) -> f64 {
        self.node_width + self.node_spacing
    }

    /// Vertical distance between the top edges of neighbouring rows.
    pub fn row_pitch(&self) -> f64 {
        self.node_height + self.level_spacing
    }
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.right() && y >= self.y && y <= self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }
}

/// Placement of one task.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub task_id: TaskId,
    pub level: usize,
    pub rect: Rect,
}

/// Placement of every task, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiagramLayout {
    positions: Vec<Position>,
    index: HashMap<TaskId, usize>,
}

impl DiagramLayout {
    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn position(&self, id: &TaskId) -> Option<&Position> {
        self.index.get(id).map(|&i| &self.positions[i])
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Smallest rectangle from the origin covering every box plus the
    /// trailing margin.
    pub fn bounds(&self, config: &LayoutConfig) -> Rect {
        let (right, bottom) = self
            .positions
            .iter()
            .fold((0.0f64, 0.0f64), |(r, b), p| {
                (r.max(p.rect.right()), b.max(p.rect.bottom()))
            });
        Rect {
            x: 0.0,
            y: 0.0,
            width: right + config.margin,
            height: bottom + config.margin,
        }
    }
}

/// Place every task given its level.
///
/// Tasks without a level (which `assign_levels` never produces) are skipped.
pub fn layout(tasks: &[Task], levels: &Levels, config: &LayoutConfig) -> DiagramLayout {
    let mut next_column: HashMap<usize, usize> = HashMap::new();
    let mut positions = Vec::with_capacity(tasks.len());
    let mut index = HashMap::with_capacity(tasks.len());

    for task in tasks {
        let Some(level) = levels.get(&task.id) else {
            continue;
        };
        let column = next_column.entry(level).or_insert(0);
        let rect = Rect {
            x: config.margin + *column as f64 * config.column_pitch(),
            y: config.margin + level as f64 * config.row_pitch(),
            width: config.node_width,
            height: config.node_height,
        };
        *column += 1;

        index.insert(task.id, positions.len());
        positions.push(Position {
            task_id: task.id,
            level,
            rect,
        });
    }

    DiagramLayout { positions, index }
}
