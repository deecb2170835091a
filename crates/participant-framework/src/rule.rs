//! # CorrelationRule Trait
//!
//! The `CorrelationRule` trait is the only thing that differs between
//! participants. The generic [`ParticipantActor`](crate::ParticipantActor)
//! owns the session, the lifecycle and the waiting; a rule supplies:
//!
//! - who the participant is ([`Identity`]),
//! - which topic pattern it listens on,
//! - what it publishes right after subscribing (pre-work),
//! - how an inbound message turns into outbound envelopes,
//! - whether the first processed message ends its wait.
//!
//! Inbound payloads are decoded into the rule's `Inbound` type before
//! [`CorrelationRule::correlate`] is called. A payload that does not fit that
//! schema is a processing error and never reaches the rule.

use crate::envelope::Envelope;
use crate::topic::{validate_identifier, TopicAddress, TopicError};
use serde::de::DeserializeOwned;
use std::fmt::{self, Debug};
use std::ops::Deref;

/// A role tag plus the identifier the participant acts under.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity {
    role: &'static str,
    id: String,
}

impl Identity {
    /// Fails with `InvalidIdentifier` when `id` cannot be used as a topic segment.
    pub fn new(role: &'static str, id: impl Into<String>) -> Result<Self, TopicError> {
        let id = id.into();
        validate_identifier(&id)?;
        Ok(Self { role, id })
    }

    pub fn role(&self) -> &'static str {
        self.role
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

/// When a participant stops waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// After the first inbound message has been processed.
    OnFirstReply,
    /// Only on a terminal session event (or the optional timeout).
    OnSessionEnd,
}

/// Envelopes derived from one inbound message.
///
/// An envelope the rule could not build is recorded as a failure; the ones
/// that were built are still sent.
#[derive(Debug)]
pub struct Outbound<E> {
    envelopes: Vec<Envelope>,
    failures: Vec<E>,
}

impl<E> Outbound<E> {
    pub fn new() -> Self {
        Self {
            envelopes: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn push(&mut self, envelope: Envelope) {
        self.envelopes.push(envelope);
    }

    /// Keeps the envelope, or records why it could not be built.
    pub fn push_result(&mut self, built: Result<Envelope, E>) {
        match built {
            Ok(envelope) => self.envelopes.push(envelope),
            Err(e) => self.failures.push(e),
        }
    }

    pub fn failures(&self) -> &[E] {
        &self.failures
    }

    pub fn into_parts(self) -> (Vec<Envelope>, Vec<E>) {
        (self.envelopes, self.failures)
    }
}

impl<E> Default for Outbound<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> From<Vec<Envelope>> for Outbound<E> {
    fn from(envelopes: Vec<Envelope>) -> Self {
        Self {
            envelopes,
            failures: Vec::new(),
        }
    }
}

impl<E> Deref for Outbound<E> {
    type Target = [Envelope];

    fn deref(&self) -> &[Envelope] {
        &self.envelopes
    }
}

/// Per-role behaviour plugged into the generic participant actor.
///
/// Rules are stateless: they only build new envelopes from what they are given.
pub trait CorrelationRule: Send + Sync + 'static {
    /// The typed record inbound payloads are decoded into.
    type Inbound: DeserializeOwned + Debug + Send;

    /// The rule's own error type, reported as a processing error.
    type Error: std::error::Error + Send + Sync + 'static;

    fn identity(&self) -> &Identity;

    /// The pattern this participant subscribes to.
    fn subscription(&self) -> Result<TopicAddress, TopicError>;

    fn termination(&self) -> Termination {
        Termination::OnSessionEnd
    }

    /// Envelopes published once the subscription is in place.
    fn on_subscribed(&self) -> Result<Vec<Envelope>, Self::Error> {
        Ok(Vec::new())
    }

    /// Derives the outbound envelopes for one decoded inbound message.
    ///
    /// `Err` rejects the message as a whole and nothing is sent.
    fn correlate(&self, inbound: Self::Inbound, envelope: &Envelope) -> Result<Outbound<Self::Error>, Self::Error>;
}
