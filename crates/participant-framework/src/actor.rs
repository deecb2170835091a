//! # Generic Participant Actor
//!
//! This module defines the `ParticipantActor`, the one actor every role runs.
//! It owns a broker session for the duration of [`ParticipantActor::run`] and
//! drives the [`SessionLifecycle`](crate::SessionLifecycle); the role-specific
//! part is delegated to a [`CorrelationRule`].
//!
//! Two tasks are involved per participant:
//!
//! - the task awaiting `run()`, which connects, subscribes, publishes the
//!   rule's pre-work and then parks on the release latch;
//! - a dispatch task draining the session inbox, which handles inbound
//!   messages and session events and may release the latch.

use crate::broker::{
    BrokerContext, BrokerSession, Credentials, SessionDelivery, SessionEvent, SessionInbox,
    SessionProperties, DEFAULT_RECONNECT_RETRIES,
};
use crate::envelope::Envelope;
use crate::error::ParticipantError;
use crate::handle::{ParticipantHandle, Shared};
use crate::latch::Release;
use crate::lifecycle::SessionState;
use crate::rule::{CorrelationRule, Termination};
use crate::topic::TopicAddress;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Session tuning that is not part of the credentials.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantSettings {
    pub reconnect_retries: u32,
    pub no_local: bool,
    /// Gives up waiting after this long. `None` waits forever.
    pub wait_timeout: Option<Duration>,
}

impl Default for ParticipantSettings {
    fn default() -> Self {
        Self {
            reconnect_retries: DEFAULT_RECONNECT_RETRIES,
            no_local: false,
            wait_timeout: None,
        }
    }
}

/// How a completed `run()` ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOutcome {
    pub release: Release,
}

/// The generic participant, parameterized by its correlation rule.
///
/// # Usage Pattern
///
/// 1. **Create**: `ParticipantActor::new(rule, credentials)` returns the actor
///    and a [`ParticipantHandle`] for observing it.
/// 2. **Run**: spawn `actor.run(broker)`; it resolves once the participant is
///    released or fails to start.
///
/// ```rust
/// use participant_framework::memory::InMemoryBroker;
/// use participant_framework::{
///     CorrelationRule, Credentials, Envelope, Identity, Outbound, ParticipantActor, SessionState,
///     TopicAddress, TopicError,
/// };
///
/// struct Sink { identity: Identity }
///
/// impl CorrelationRule for Sink {
///     type Inbound = serde_json::Value;
///     type Error = TopicError;
///
///     fn identity(&self) -> &Identity { &self.identity }
///     fn subscription(&self) -> Result<TopicAddress, TopicError> {
///         TopicAddress::parse("sink/*")
///     }
///     fn correlate(&self, _: serde_json::Value, _: &Envelope) -> Result<Outbound<TopicError>, TopicError> {
///         Ok(Outbound::new())
///     }
/// }
///
/// #[tokio::main]
/// async fn main() {
///     let broker = InMemoryBroker::new();
///     let rule = Sink { identity: Identity::new("sink", "S1").unwrap() };
///     let credentials = Credentials::new("tcp://localhost:55555", "vpn", "sink", "");
///
///     let (actor, handle) = ParticipantActor::new(rule, credentials);
///     let task = tokio::spawn(actor.run(broker.clone()));
///
///     handle.wait_for_state(SessionState::AwaitingTerminalEvent).await;
///     broker.disconnect_all();
///     assert!(task.await.unwrap().is_ok());
/// }
/// ```
pub struct ParticipantActor<R: CorrelationRule> {
    rule: Arc<R>,
    credentials: Credentials,
    settings: ParticipantSettings,
    shared: Arc<Shared>,
}

impl<R: CorrelationRule> ParticipantActor<R> {
    pub fn new(rule: R, credentials: Credentials) -> (Self, ParticipantHandle) {
        Self::with_settings(rule, credentials, ParticipantSettings::default())
    }

    pub fn with_settings(
        rule: R,
        credentials: Credentials,
        settings: ParticipantSettings,
    ) -> (Self, ParticipantHandle) {
        let shared = Arc::new(Shared::new());
        let handle = ParticipantHandle::new(rule.identity().clone(), shared.clone());
        let actor = Self {
            rule: Arc::new(rule),
            credentials,
            settings,
            shared,
        };
        (actor, handle)
    }

    /// Validates configuration, opens a session, subscribes, publishes the
    /// rule's pre-work and then waits until released.
    ///
    /// The session is closed on every exit path.
    pub async fn run<B: BrokerContext>(self, broker: B) -> Result<RunOutcome, ParticipantError> {
        let role = self.rule.identity().role();
        let id = self.rule.identity().id().to_string();

        if let Err(e) = self.credentials.validate() {
            error!(role, %id, error = %e, "Refusing to start");
            return Err(e);
        }
        let pattern = match self.rule.subscription() {
            Ok(pattern) => pattern,
            Err(e) => {
                let e = ParticipantError::from(e);
                error!(role, %id, error = %e, "Refusing to start");
                return Err(e);
            }
        };

        self.shared.lifecycle.transition(SessionState::Connecting)?;
        info!(
            role,
            %id,
            endpoint = %self.credentials.endpoint,
            username = %self.credentials.username,
            namespace = %self.credentials.namespace,
            "Connecting"
        );

        let properties = SessionProperties {
            credentials: self.credentials.clone(),
            reconnect_retries: self.settings.reconnect_retries,
            no_local: self.settings.no_local,
        };
        let (session, inbox) = broker.create_session(properties);
        let handler = SessionHandler {
            rule: self.rule.clone(),
            session: session.clone(),
            subscription: pattern.clone(),
            shared: self.shared.clone(),
        };
        let guard = SessionGuard {
            session: session.clone(),
            dispatch: Some(tokio::spawn(handler.clone().dispatch(inbox))),
        };

        if let Err(status) = session.connect().await {
            return Err(self.fail(guard, ParticipantError::Connection(status)));
        }
        self.shared.lifecycle.transition(SessionState::Subscribed)?;
        info!(role, %id, "Session connected");

        if let Err(status) = session.subscribe(&pattern, true).await {
            let e = ParticipantError::Subscription {
                topic: pattern.render(),
                status,
            };
            return Err(self.fail(guard, e));
        }
        info!(role, %id, topic = %pattern, "Subscribed");

        match self.rule.on_subscribed() {
            Ok(envelopes) => {
                handler.send_all(envelopes).await;
            }
            Err(e) => {
                let e = ParticipantError::Processing(Box::new(e));
                warn!(role, %id, error = %e, "Pre-work failed");
                self.shared.report(&e);
            }
        }

        self.shared.lifecycle.transition(SessionState::AwaitingTerminalEvent)?;
        info!(role, %id, "Waiting for a terminal event");

        let release = match self.settings.wait_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.shared.latch.wait()).await {
                Ok(release) => release,
                Err(_) => {
                    self.shared.latch.release(Release::TimedOut);
                    self.shared.latch.reason().unwrap_or(Release::TimedOut)
                }
            },
            None => self.shared.latch.wait().await,
        };

        drop(guard);
        self.shared.lifecycle.transition(SessionState::Terminated)?;
        info!(role, %id, ?release, "Participant finished");
        Ok(RunOutcome { release })
    }

    fn fail(&self, guard: SessionGuard, e: ParticipantError) -> ParticipantError {
        drop(guard);
        let _ = self.shared.lifecycle.transition(SessionState::Terminated);
        error!(
            role = self.rule.identity().role(),
            id = %self.rule.identity().id(),
            error = %e,
            "Participant terminated"
        );
        e
    }
}

/// Closes the session and stops the dispatch task when dropped.
struct SessionGuard {
    session: Arc<dyn BrokerSession>,
    dispatch: Option<JoinHandle<()>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        if let Some(dispatch) = self.dispatch.take() {
            dispatch.abort();
        }
        self.session.close();
    }
}

/// Callback side of a participant: runs on the dispatch task.
struct SessionHandler<R: CorrelationRule> {
    rule: Arc<R>,
    session: Arc<dyn BrokerSession>,
    subscription: TopicAddress,
    shared: Arc<Shared>,
}

impl<R: CorrelationRule> Clone for SessionHandler<R> {
    fn clone(&self) -> Self {
        Self {
            rule: self.rule.clone(),
            session: self.session.clone(),
            subscription: self.subscription.clone(),
            shared: self.shared.clone(),
        }
    }
}

impl<R: CorrelationRule> SessionHandler<R> {
    async fn dispatch(self, mut inbox: SessionInbox) {
        while let Some(delivery) = inbox.recv().await {
            match delivery {
                SessionDelivery::Message(envelope) => self.on_message_delivered(envelope).await,
                SessionDelivery::Event(event) => {
                    self.on_session_event(event);
                }
            }
        }
        debug!(role = self.role(), "Inbox closed");
    }

    fn role(&self) -> &'static str {
        self.rule.identity().role()
    }

    fn id(&self) -> &str {
        self.rule.identity().id()
    }

    /// Correlates one inbound message and sends whatever the rule produced.
    async fn on_message_delivered(&self, envelope: Envelope) {
        self.process(envelope).await;
        self.shared.count_delivery();
    }

    async fn process(&self, envelope: Envelope) {
        let topic = envelope.topic();
        if !self.subscription.matches(&envelope.destination) {
            debug!(role = self.role(), id = %self.id(), %topic, "Ignoring message outside subscription");
            return;
        }

        let inbound: R::Inbound = match envelope.decode() {
            Ok(inbound) => inbound,
            Err(e) => return self.processing_failed(&topic, Box::new(e)),
        };
        debug!(role = self.role(), id = %self.id(), %topic, ?inbound, "Received");

        let outbound = match self.rule.correlate(inbound, &envelope) {
            Ok(outbound) => outbound,
            Err(e) => return self.processing_failed(&topic, Box::new(e)),
        };
        let (outbound, failures) = outbound.into_parts();
        self.shared.accept(envelope);
        for failure in failures {
            self.processing_failed(&topic, Box::new(failure));
        }
        self.send_all(outbound).await;

        if self.rule.termination() == Termination::OnFirstReply && self.shared.latch.release(Release::Replied) {
            info!(role = self.role(), id = %self.id(), "Workflow complete");
        }
    }

    fn processing_failed(&self, topic: &str, cause: Box<dyn std::error::Error + Send + Sync>) {
        let e = ParticipantError::Processing(cause);
        warn!(role = self.role(), id = %self.id(), %topic, error = %e, "Could not process message");
        self.shared.report(&e);
    }

    /// Best-effort: a failed send is reported and the next one still goes out.
    async fn send_all(&self, envelopes: Vec<Envelope>) -> usize {
        let mut sent = 0;
        for envelope in envelopes {
            let topic = envelope.topic();
            match self.session.send(&envelope).await {
                Ok(()) => {
                    sent += 1;
                    info!(role = self.role(), id = %self.id(), %topic, "Sent");
                }
                Err(status) => {
                    let e = ParticipantError::Send { topic, status };
                    warn!(role = self.role(), id = %self.id(), error = %e, "Send failed");
                    self.shared.report(&e);
                }
            }
        }
        sent
    }

    /// Releases the wait on terminal events; everything else is only logged.
    fn on_session_event(&self, event: SessionEvent) -> bool {
        info!(role = self.role(), id = %self.id(), ?event, "Session event");
        if !event.is_terminal() {
            return false;
        }
        let released = self.shared.latch.release(Release::SessionEnded(event));
        if released {
            warn!(role = self.role(), id = %self.id(), ?event, "Session lost, no longer waiting");
        }
        released
    }
}
