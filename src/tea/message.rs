//! Messages for the TEA (The Elm Architecture) pattern.
//!
//! Messages are inputs to the update function - they come from terminal
//! events, background actors, or command completion callbacks.

use crossterm::event::{KeyEvent, MouseEvent};

use crate::core::cpm::CriticalOverlay;
use crate::core::task::{Task, TaskId};
use crate::store::TaskSnapshot;
use crate::Error;

/// Input messages to the update function.
#[derive(Debug)]
pub enum Message {
    // Keyboard/terminal events
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),

    // From background actors
    RefreshTick,
    /// Session token changed; carries whether a token is present.
    SessionChanged(bool),

    // Command completion callbacks
    TasksLoaded(TaskSnapshot),
    TasksFailed(Error),
    CriticalLoaded(CriticalOverlay),
    CriticalFailed(Error),
    DependencyAdded(Task),
    DependencyRemoved(Task),
    DependencyFailed {
        task: TaskId,
        prerequisite: TaskId,
        error: Error,
    },
}
