//! PERT diagram: layout, draw commands, viewport, and chart state.

pub mod chart;
pub mod draw;
pub mod layout;
pub mod viewport;

pub use chart::{DiagramError, Drawing, PertChart, SelectionChange};
pub use draw::{DrawCommand, EdgeStyle, NodeStyle, Point, TextStyle};
pub use layout::{DiagramLayout, LayoutConfig, Position, Rect};
pub use viewport::Viewport;
