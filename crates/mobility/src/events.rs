//! Change notification for the stores.
//!
//! Each store owns an [`EventBus`]. Views (or anything else) call `subscribe`
//! and drain the returned receiver; dropping the receiver unsubscribes.

use std::sync::Mutex;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::preferences::PreferenceKey;

/// A preference field was written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreferenceChange {
    /// The field that changed.
    pub key: PreferenceKey,
}

/// The saved route list was rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutesChanged {
    /// Number of routes after the change.
    pub len: usize,
}

/// Fan-out of events to any number of subscribers.
#[derive(Debug)]
pub struct EventBus<E> {
    subscribers: Mutex<Vec<Sender<E>>>,
}

impl<E: Clone> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone> EventBus<E> {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Subscribe to all future events.
    pub fn subscribe(&self) -> Receiver<E> {
        let (tx, rx) = unbounded();
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.push(tx);
        }
        rx
    }

    /// Deliver `event` to every subscriber, dropping disconnected ones.
    pub fn emit(&self, event: &E) {
        if let Ok(mut subs) = self.subscribers.lock() {
            subs.retain(|tx| tx.send(event.clone()).is_ok());
        }
    }

    /// Number of subscribers that were still connected at the last emit.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().map(|s| s.len()).unwrap_or(0)
    }
}
