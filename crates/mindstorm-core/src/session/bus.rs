//! Per-session broadcast channels for change notifications.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::broadcast;

use super::code::SessionCode;
use super::event::SessionEvent;
use crate::error::{MindstormError, Result};

pub const DEFAULT_EVENT_CAPACITY: usize = 256;

/// Registry of broadcast channels, one per live session.
///
/// Publishing never blocks and never waits for subscribers: events on a
/// channel nobody listens to are dropped, and a subscriber that falls behind
/// skips ahead instead of slowing the publisher down.
pub struct NotificationBus {
    capacity: usize,
    channels: RwLock<HashMap<SessionCode, broadcast::Sender<SessionEvent>>>,
}

impl NotificationBus {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            channels: RwLock::new(HashMap::new()),
        }
    }

    /// Creates the channel for a session and returns its sending half.
    pub fn register(&self, code: SessionCode) -> broadcast::Sender<SessionEvent> {
        let (tx, _) = broadcast::channel(self.capacity);
        self.write().insert(code, tx.clone());
        tx
    }

    /// Drops the channel registration. Existing subscribers keep draining
    /// events already sent; their streams end once every sender is gone.
    pub fn unregister(&self, code: &SessionCode) {
        self.write().remove(code);
    }

    /// Subscribes to a session's events from now on.
    pub fn subscribe(&self, code: &SessionCode) -> Result<EventStream> {
        let channels = self.read();
        let tx = channels
            .get(code)
            .ok_or_else(|| MindstormError::not_found("session", code.as_str()))?;
        Ok(EventStream::new(tx.subscribe()))
    }

    /// Publishes an event to a session's channel. Returns `false` when the
    /// session is unknown or nobody is subscribed.
    pub fn publish(&self, code: &SessionCode, event: SessionEvent) -> bool {
        match self.read().get(code) {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<SessionCode, broadcast::Sender<SessionEvent>>> {
        self.channels.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<SessionCode, broadcast::Sender<SessionEvent>>> {
        self.channels
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_CAPACITY)
    }
}

/// Receiving half of a session subscription.
#[derive(Debug)]
pub struct EventStream {
    rx: broadcast::Receiver<SessionEvent>,
}

impl EventStream {
    pub(crate) fn new(rx: broadcast::Receiver<SessionEvent>) -> Self {
        Self { rx }
    }

    /// Waits for the next event. Skips ahead when the subscriber lagged
    /// behind the channel capacity; returns `None` once the session's
    /// senders are gone and the backlog is drained.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Non-blocking variant of [`next`](Self::next): `None` when no event is
    /// currently buffered.
    pub fn try_next(&mut self) -> Option<SessionEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged, skipping ahead");
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => return None,
            }
        }
    }
}
