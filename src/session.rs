//! Explicit session context for the API client.
//!
//! The bearer token is held in a `watch` channel. The HTTP collaborator
//! reads the current value on every request, and any part of the app can
//! subscribe to changes (for example, the token being cleared after a 401).

use std::sync::Arc;

use tokio::sync::watch;

use crate::plog_debug;

/// Authentication state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub token: Option<String>,
    pub user: Option<String>,
}

impl Session {
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            user: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Pick the first non-empty token: command line, then environment,
    /// then config file.
    pub fn resolve(
        cli: Option<String>,
        env: Option<String>,
        config: Option<String>,
    ) -> Self {
        let token = [cli, env, config]
            .into_iter()
            .flatten()
            .find(|t| !t.trim().is_empty());
        Self { token, user: None }
    }
}

/// Shared, observable session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    tx: Arc<watch::Sender<Session>>,
}

impl SessionContext {
    pub fn new(session: Session) -> Self {
        let (tx, _rx) = watch::channel(session);
        Self { tx: Arc::new(tx) }
    }

    pub fn current(&self) -> Session {
        self.tx.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().token.clone()
    }

    /// Replace the session and notify subscribers.
    pub fn set(&self, session: Session) {
        plog_debug!(
            "SessionContext::set authenticated={}",
            session.is_authenticated()
        );
        self.tx.send_replace(session);
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let mut session = self.current();
        session.token = Some(token.into());
        self.set(session);
    }

    /// Drop credentials, e.g. after the server reports the token expired.
    pub fn clear(&self) {
        self.set(Session::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new(Session::default())
    }
}
