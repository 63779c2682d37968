//! Refresh actor: asks the logic thread to reload the project on an interval.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::tea::Message;
use crate::{plog_debug, plog_trace};

use super::ActorHandle;

pub struct RefreshActor {
    msg_tx: mpsc::UnboundedSender<Message>,
    interval: Duration,
}

impl RefreshActor {
    pub fn new(msg_tx: mpsc::UnboundedSender<Message>, interval: Duration) -> Self {
        Self { msg_tx, interval }
    }

    pub fn spawn(self) -> ActorHandle {
        let cancel = CancellationToken::new();
        let cancel_clone = cancel.clone();

        plog_debug!("RefreshActor::spawn interval={:?}", self.interval);

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The initial load is issued by the logic thread; skip the immediate tick.
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = cancel_clone.cancelled() => {
                        plog_debug!("RefreshActor cancelled");
                        break;
                    }
                    _ = interval.tick() => {
                        plog_trace!("RefreshActor tick");
                        if self.msg_tx.send(Message::RefreshTick).is_err() {
                            plog_debug!("RefreshActor: message channel closed");
                            break;
                        }
                    }
                }
            }
        });

        ActorHandle::new(cancel)
    }
}
