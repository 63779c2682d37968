//! Actor system for background tasks.
//!
//! Each actor is an independent tokio task that communicates with the main
//! application via message passing. Actors handle:
//! - Periodic project refresh (RefreshActor)
//! - Session token changes (SessionWatchActor)
//!
//! Keyboard and mouse input is handled synchronously in the logic thread.

pub mod refresh;
pub mod session_watch;

use tokio_util::sync::CancellationToken;

pub use refresh::RefreshActor;
pub use session_watch::SessionWatchActor;

/// Handle to a running actor, used for graceful shutdown.
pub struct ActorHandle {
    cancel: CancellationToken,
}

impl ActorHandle {
    pub fn new(cancel: CancellationToken) -> Self {
        Self { cancel }
    }

    /// Signal the actor to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
