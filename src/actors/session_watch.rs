//! Forwards session changes (token set or cleared) to the logic thread.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::session::SessionContext;
use crate::tea::Message;
use crate::plog_debug;

use super::ActorHandle;

pub struct SessionWatchActor {
    msg_tx: mpsc::UnboundedSender<Message>,
    session: SessionContext,
}

impl SessionWatchActor {
    pub fn new(msg_tx: mpsc::UnboundedSender<Message>, session: SessionContext) -> Self {
        Self { msg_tx, session }
    }

    pub fn spawn(self) -> ActorHandle {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();
        let mut rx = self.session.subscribe();

        plog_debug!("SessionWatchActor::spawn");

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        plog_debug!("SessionWatchActor cancelled");
                        break;
                    }
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let authenticated = rx.borrow_and_update().is_authenticated();
                        if self.msg_tx.send(Message::SessionChanged(authenticated)).is_err() {
                            break;
                        }
                    }
                }
            }
        });

        ActorHandle::new(cancel)
    }
}
