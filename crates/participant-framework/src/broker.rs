//! # Broker Collaborator
//!
//! The broker client is an external collaborator. This module only fixes the
//! shape the participant actors rely on:
//!
//! - [`BrokerContext`] creates sessions from [`SessionProperties`].
//! - [`BrokerSession`] offers connect, subscribe, send and close.
//! - Inbound messages and session events arrive, in order, on the
//!   [`SessionInbox`] returned alongside the session.
//!
//! See [`crate::memory::InMemoryBroker`] for an in-process implementation and
//! [`crate::mock::MockBroker`] for a scriptable one.

use crate::envelope::Envelope;
use crate::error::ParticipantError;
use crate::topic::TopicAddress;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;

/// Reconnect attempts the broker client makes before giving up.
pub const DEFAULT_RECONNECT_RETRIES: u32 = 3;

/// Connection credentials, consumed only when a session connects.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    pub endpoint: String,
    pub namespace: String,
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(
        endpoint: impl Into<String>,
        namespace: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: namespace.into(),
            username: username.into(),
            password: password.into(),
        }
    }

    /// Rejects blank endpoint, namespace or username.
    pub fn validate(&self) -> Result<(), ParticipantError> {
        if self.endpoint.trim().is_empty() {
            return Err(ParticipantError::Configuration("endpoint must be non-empty".into()));
        }
        if self.namespace.trim().is_empty() {
            return Err(ParticipantError::Configuration("namespace must be non-empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(ParticipantError::Configuration("username must be non-empty".into()));
        }
        Ok(())
    }
}

/// Everything the broker needs to open a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionProperties {
    pub credentials: Credentials,
    pub reconnect_retries: u32,
    /// Do not deliver this session's own publications back to it.
    pub no_local: bool,
}

/// Connectivity notifications raised by the broker client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionEvent {
    UpNotice,
    SubscriptionOk,
    Reconnecting,
    Reconnected,
    ReconnectFailed,
    Disconnected,
}

impl SessionEvent {
    /// Events after which the session is gone for good.
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionEvent::Disconnected | SessionEvent::ReconnectFailed)
    }
}

/// Status codes returned by broker calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum BrokerStatus {
    #[error("session not connected")]
    NotReady,
    #[error("connection refused")]
    Refused,
    #[error("operation failed")]
    Fail,
    #[error("subscription rejected")]
    SubscriptionRejected,
    #[error("session closed")]
    Closed,
}

/// One item on a session's callback channel.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionDelivery {
    Message(Envelope),
    Event(SessionEvent),
}

/// Receiving end of a session's callback channel.
pub type SessionInbox = mpsc::UnboundedReceiver<SessionDelivery>;

/// Factory for broker sessions.
pub trait BrokerContext: Send + Sync + 'static {
    fn create_session(&self, properties: SessionProperties) -> (Arc<dyn BrokerSession>, SessionInbox);
}

/// A single connection to the broker.
#[async_trait]
pub trait BrokerSession: Send + Sync {
    async fn connect(&self) -> Result<(), BrokerStatus>;

    async fn subscribe(&self, pattern: &TopicAddress, confirm: bool) -> Result<(), BrokerStatus>;

    async fn send(&self, envelope: &Envelope) -> Result<(), BrokerStatus>;

    /// Releases the connection. Safe to call more than once.
    fn close(&self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_validation() {
        let good = Credentials::new("tcp://localhost:55555", "vpn", "user", "");
        assert!(good.validate().is_ok());

        for bad in [
            Credentials::new(" ", "vpn", "user", "pw"),
            Credentials::new("tcp://h", "", "user", "pw"),
            Credentials::new("tcp://h", "vpn", "\t", "pw"),
        ] {
            assert!(matches!(bad.validate(), Err(ParticipantError::Configuration(_))));
        }
    }

    #[test]
    fn test_terminal_events() {
        assert!(SessionEvent::Disconnected.is_terminal());
        assert!(SessionEvent::ReconnectFailed.is_terminal());
        assert!(!SessionEvent::Reconnecting.is_terminal());
        assert!(!SessionEvent::UpNotice.is_terminal());
    }
}
