//! Zoom, pan, and pointer-to-diagram mapping.

use crate::core::task::TaskId;
use crate::diagram::draw::Point;
use crate::diagram::layout::DiagramLayout;

pub const MIN_ZOOM: f64 = 0.5;
pub const MAX_ZOOM: f64 = 2.0;
pub const ZOOM_STEP: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    zoom: f64,
    /// Diagram-space offset of the visible origin.
    pan: Point,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Point::new(0.0, 0.0),
        }
    }
}

/// Round to one decimal so repeated steps land on exact values.
fn round_step(zoom: f64) -> f64 {
    (zoom * 10.0).round() / 10.0
}

impl Viewport {
    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn zoom_in(&mut self) {
        self.zoom = round_step(self.zoom + ZOOM_STEP).min(MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = round_step(self.zoom - ZOOM_STEP).max(MIN_ZOOM);
    }

    pub fn reset_zoom(&mut self) {
        self.zoom = 1.0;
    }

    /// Set an arbitrary zoom, clamped to the allowed range.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = round_step(zoom).clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    /// Move the view by a diagram-space offset. The origin cannot go
    /// negative.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.pan = Point::new((self.pan.x + dx).max(0.0), (self.pan.y + dy).max(0.0));
    }

    pub fn reset_pan(&mut self) {
        self.pan = Point::new(0.0, 0.0);
    }

    /// Pointer in surface coordinates to diagram coordinates.
    pub fn to_diagram(&self, pointer: Point, origin: Point) -> Point {
        Point::new(
            (pointer.x - origin.x) / self.zoom + self.pan.x,
            (pointer.y - origin.y) / self.zoom + self.pan.y,
        )
    }

    /// The task whose box contains `point`, if exactly one does.
    pub fn hit_test(&self, layout: &DiagramLayout, point: Point) -> Option<TaskId> {
        let mut hits = layout
            .positions()
            .iter()
            .filter(|p| p.rect.contains(point.x, point.y));
        let first = hits.next()?;
        match hits.next() {
            Some(_) => None,
            None => Some(first.task_id),
        }
    }
}
