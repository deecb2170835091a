//! # Release Latch
//!
//! The single blocking point of a participant. `run()` parks on
//! [`ReleaseLatch::wait`]; the message and session-event handlers call
//! [`ReleaseLatch::release`] from the dispatch task. The first release wins
//! and records its reason. Later releases are no-ops that report `false`.

use crate::broker::SessionEvent;
use tokio::sync::watch;

/// Why a participant stopped waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// The actor's workflow ended with a processed reply.
    Replied,
    /// The broker reported a terminal session event.
    SessionEnded(SessionEvent),
    /// The optional wait timeout elapsed.
    TimedOut,
}

/// A one-shot, idempotent release signal.
#[derive(Debug)]
pub struct ReleaseLatch {
    slot: watch::Sender<Option<Release>>,
}

impl Default for ReleaseLatch {
    fn default() -> Self {
        Self::new()
    }
}

impl ReleaseLatch {
    pub fn new() -> Self {
        let (slot, _) = watch::channel(None);
        Self { slot }
    }

    /// Latches `reason`. Returns `true` only for the call that actually
    /// released the waiter.
    pub fn release(&self, reason: Release) -> bool {
        self.slot.send_if_modified(|slot| {
            if slot.is_some() {
                return false;
            }
            *slot = Some(reason);
            true
        })
    }

    pub fn reason(&self) -> Option<Release> {
        *self.slot.borrow()
    }

    pub fn is_released(&self) -> bool {
        self.reason().is_some()
    }

    /// Resolves once the latch has been released, immediately if it already was.
    pub async fn wait(&self) -> Release {
        let mut rx = self.slot.subscribe();
        loop {
            let current = *rx.borrow_and_update();
            if let Some(reason) = current {
                return reason;
            }
            if rx.changed().await.is_err() {
                // the sender lives in `self`, so this only happens on teardown
                return Release::TimedOut;
            }
        }
    }
}
