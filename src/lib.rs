pub mod api;
pub mod config;
pub mod core;
pub mod diagram;
pub mod error;
pub mod log;
pub mod session;
pub mod store;
pub mod util;

// Decoupled game loop architecture
pub mod actors;
pub mod app;
pub mod render;
pub mod tea;
pub mod ui;

pub use crate::core::{CriticalOverlay, Task, TaskId};
pub use error::{Error, Result};
pub use session::{Session, SessionContext};
pub use store::{DependencyStore, TaskSnapshot};
