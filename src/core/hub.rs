//! Publish/subscribe fan-out for repository change notifications.
//!
//! The hub is the in-process boundary a live-update transport would
//! attach to: the poller publishes immutable events, subscribers receive
//! them over their own channel and copy whatever they need.

use std::sync::mpsc::{Receiver, Sender};
use std::time::{SystemTime, UNIX_EPOCH};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// What kind of repository change was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    /// An untracked file appeared.
    FileAdded,
    /// A tracked file was deleted.
    FileDeleted,
    /// Any other status change.
    FileChanged,
}

/// A change notification delivered to subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeEvent {
    /// What changed.
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
}

/// Fan-out hub: every subscriber gets every published event.
#[derive(Debug, Default)]
pub struct ChangeHub {
    subscribers: Mutex<Vec<Sender<ChangeEvent>>>,
}

impl ChangeHub {
    /// Create a hub with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber and return its receiving end.
    pub fn subscribe(&self) -> Receiver<ChangeEvent> {
        let (tx, rx) = std::sync::mpsc::channel();
        self.subscribers.lock().push(tx);
        rx
    }

    /// Publish an event to all live subscribers, dropping the ones whose
    /// receiver has gone away.
    pub fn publish(&self, kind: ChangeKind) {
        let event = ChangeEvent {
            kind,
            timestamp: now_secs(),
        };
        self.subscribers
            .lock()
            .retain(|tx| tx.send(event).is_ok());
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
