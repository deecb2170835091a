//! # Participant Handle
//!
//! The `ParticipantHandle` is the observer half of a participant, returned by
//! [`ParticipantActor::new`](crate::ParticipantActor::new) next to the actor
//! itself. It is cheap to clone and can be shared across tasks.
//!
//! * **State** – current [`SessionState`] and a way to wait for one.
//! * **Journal** – every non-fatal error the actor reported.
//! * **Deliveries** – how many inbound messages reached the actor, and the
//!   last one it accepted.

use crate::envelope::Envelope;
use crate::error::{ErrorKind, ParticipantError, ReportedError};
use crate::latch::{Release, ReleaseLatch};
use crate::lifecycle::{SessionLifecycle, SessionState};
use crate::rule::Identity;
use std::sync::Arc;
use tokio::sync::watch;

/// State shared between an actor, its dispatch task and its handles.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) lifecycle: SessionLifecycle,
    pub(crate) latch: ReleaseLatch,
    journal: watch::Sender<Vec<ReportedError>>,
    delivered: watch::Sender<usize>,
    last_inbound: watch::Sender<Option<Envelope>>,
}

impl Shared {
    pub(crate) fn new() -> Self {
        Self {
            lifecycle: SessionLifecycle::new(),
            latch: ReleaseLatch::new(),
            journal: watch::channel(Vec::new()).0,
            delivered: watch::channel(0).0,
            last_inbound: watch::channel(None).0,
        }
    }

    pub(crate) fn report(&self, error: &ParticipantError) {
        let entry = ReportedError::from(error);
        self.journal.send_modify(|journal| journal.push(entry));
    }

    pub(crate) fn count_delivery(&self) {
        self.delivered.send_modify(|count| *count += 1);
    }

    pub(crate) fn accept(&self, envelope: Envelope) {
        self.last_inbound.send_replace(Some(envelope));
    }
}

/// Read-only view of a running participant.
#[derive(Clone, Debug)]
pub struct ParticipantHandle {
    identity: Identity,
    shared: Arc<Shared>,
}

impl ParticipantHandle {
    pub(crate) fn new(identity: Identity, shared: Arc<Shared>) -> Self {
        Self { identity, shared }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn state(&self) -> SessionState {
        self.shared.lifecycle.state()
    }

    /// Waits for `target`, or for `Terminated` if the actor ends first.
    pub async fn wait_for_state(&self, target: SessionState) -> SessionState {
        self.shared.lifecycle.wait_for(target).await
    }

    pub fn release_reason(&self) -> Option<Release> {
        self.shared.latch.reason()
    }

    pub fn is_released(&self) -> bool {
        self.shared.latch.is_released()
    }

    pub fn errors(&self) -> Vec<ReportedError> {
        self.shared.journal.borrow().clone()
    }

    pub fn error_count(&self, kind: ErrorKind) -> usize {
        self.shared
            .journal
            .borrow()
            .iter()
            .filter(|error| error.kind == kind)
            .count()
    }

    /// Waits until at least `count` errors have been reported.
    pub async fn wait_for_errors(&self, count: usize) -> Vec<ReportedError> {
        let mut rx = self.shared.journal.subscribe();
        let result = match rx.wait_for(|journal| journal.len() >= count).await {
            Ok(journal) => journal.clone(),
            Err(_) => self.errors(),
        };
        result
    }

    pub fn delivered(&self) -> usize {
        *self.shared.delivered.borrow()
    }

    /// Waits until at least `count` inbound messages reached the actor.
    pub async fn wait_for_deliveries(&self, count: usize) -> usize {
        let mut rx = self.shared.delivered.subscribe();
        let result = match rx.wait_for(|delivered| *delivered >= count).await {
            Ok(delivered) => *delivered,
            Err(_) => self.delivered(),
        };
        result
    }

    /// The last inbound envelope the actor processed successfully.
    pub fn last_inbound(&self) -> Option<Envelope> {
        self.shared.last_inbound.borrow().clone()
    }
}
