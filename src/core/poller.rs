//! Polling change detector.
//!
//! Compares successive `git status --porcelain` snapshots on an interval
//! and publishes a classified event to the hub whenever the snapshot
//! changes. Polling the porcelain status (rather than watching the file
//! system) means index-only operations like `git add` are detected too.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::core::{status_snapshot, ChangeHub, ChangeKind, RepoRoot};

/// Poller configuration. The debug flag is passed in explicitly rather
/// than read from the environment at use sites.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Time between status snapshots.
    pub interval: Duration,
    /// Log poll errors and detected changes to stderr.
    pub debug: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            debug: false,
        }
    }
}

/// Background status poller feeding a [`ChangeHub`].
pub struct StatusPoller {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StatusPoller {
    /// Spawn the polling thread.
    pub fn spawn(root: RepoRoot, hub: Arc<ChangeHub>, config: PollerConfig) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let handle = std::thread::spawn(move || {
            let mut last: Option<String> = None;
            while !stop_flag.load(Ordering::Relaxed) {
                match status_snapshot(&root) {
                    Ok(current) => {
                        // The first snapshot is a baseline, not a change.
                        if let Some(previous) = &last {
                            if *previous != current {
                                let kind = classify_change(previous, &current);
                                if config.debug {
                                    eprintln!("[poller] status changed: {:?}", kind);
                                }
                                hub.publish(kind);
                            }
                        }
                        last = Some(current);
                    }
                    Err(e) => {
                        if config.debug {
                            eprintln!("[poller] status check failed: {}", e);
                        }
                    }
                }
                std::thread::sleep(config.interval);
            }
        });

        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Signal the thread to stop and wait for it to exit.
    pub fn stop(mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for StatusPoller {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// Classify what changed between two porcelain snapshots.
fn classify_change(previous: &str, current: &str) -> ChangeKind {
    let untracked = |s: &str| s.lines().filter(|l| l.starts_with("??")).count();
    let deleted = |s: &str| {
        s.lines()
            .filter(|l| l.as_bytes().first() == Some(&b'D') || l.as_bytes().get(1) == Some(&b'D'))
            .count()
    };

    if untracked(current) > untracked(previous) {
        ChangeKind::FileAdded
    } else if deleted(current) > deleted(previous) {
        ChangeKind::FileDeleted
    } else {
        ChangeKind::FileChanged
    }
}
