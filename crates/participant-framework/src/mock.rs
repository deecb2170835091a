//! # Mock Broker & Testing Guide
//!
//! `MockBroker` implements [`BrokerContext`] for a single session whose
//! behaviour is scripted from the test. It records everything the participant
//! does and lets the test push messages and events into the session inbox.
//!
//! ## When to use the Mock vs the In-Memory Broker
//!
//! | Feature | MockBroker | InMemoryBroker |
//! |---------|------------|----------------|
//! | **Participants** | One | Any number |
//! | **Routing** | None, the test delivers | By subscription |
//! | **Error Injection** | Per call (`return_err`) | Connection level only |
//! | **Use Case** | One actor's correlation and error paths | Whole rides |
//!
//! ## Example
//!
//! ```rust
//! use participant_framework::mock::MockBroker;
//! use participant_framework::{
//!     BrokerStatus, CorrelationRule, Credentials, Envelope, ErrorKind, Identity,
//!     Outbound, ParticipantActor, SessionEvent, SessionState, TopicAddress, TopicError,
//! };
//!
//! struct Echo { identity: Identity }
//!
//! impl CorrelationRule for Echo {
//!     type Inbound = serde_json::Value;
//!     type Error = TopicError;
//!
//!     fn identity(&self) -> &Identity { &self.identity }
//!     fn subscription(&self) -> Result<TopicAddress, TopicError> {
//!         TopicAddress::parse("echo/*")
//!     }
//!     fn correlate(&self, _: serde_json::Value, inbound: &Envelope) -> Result<Outbound<TopicError>, TopicError> {
//!         Ok(vec![Envelope::reply(inbound, TopicAddress::parse("echoed")?, inbound.payload.clone())].into())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     // 1. Script the broker
//!     let mock = MockBroker::new();
//!     mock.expect_send("echoed").return_err(BrokerStatus::NotReady);
//!
//!     // 2. Run the participant against it
//!     let rule = Echo { identity: Identity::new("echo", "E1").unwrap() };
//!     let credentials = Credentials::new("tcp://localhost:55555", "vpn", "echo", "");
//!     let (actor, handle) = ParticipantActor::new(rule, credentials);
//!     let task = tokio::spawn(actor.run(mock.clone()));
//!     handle.wait_for_state(SessionState::AwaitingTerminalEvent).await;
//!
//!     // 3. Drive it and observe
//!     mock.deliver(Envelope::new(TopicAddress::parse("echo/1").unwrap(), b"{}".to_vec()));
//!     handle.wait_for_deliveries(1).await;
//!     assert_eq!(handle.error_count(ErrorKind::Send), 1);
//!
//!     mock.emit(SessionEvent::Disconnected);
//!     assert!(task.await.unwrap().is_ok());
//!     assert!(mock.is_closed());
//!     mock.verify();
//! }
//! ```

use crate::broker::{
    BrokerContext, BrokerSession, BrokerStatus, SessionDelivery, SessionEvent, SessionInbox,
    SessionProperties,
};
use crate::envelope::Envelope;
use crate::topic::TopicAddress;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc;

// =============================================================================
// EXPECTATION BUILDER API
// =============================================================================

/// An expected send to a given topic and the status it should get.
struct SendExpectation {
    topic: String,
    response: Result<(), BrokerStatus>,
}

#[derive(Default)]
struct MockState {
    expectations: VecDeque<SendExpectation>,
    connect_response: Option<BrokerStatus>,
    subscribe_response: Option<BrokerStatus>,
    properties: Option<SessionProperties>,
    outbox: Option<mpsc::UnboundedSender<SessionDelivery>>,
    pending: Vec<SessionDelivery>,
    attempted: Vec<Envelope>,
    sent: Vec<Envelope>,
    subscriptions: Vec<TopicAddress>,
    connected: bool,
    closed: bool,
}

impl MockState {
    fn push(&mut self, delivery: SessionDelivery) {
        match &self.outbox {
            Some(outbox) => {
                let _ = outbox.send(delivery);
            }
            None => self.pending.push(delivery),
        }
    }
}

/// A scriptable broker for unit-testing one participant.
///
/// Sends without a matching expectation succeed. Expectations are matched by
/// topic in the order they were registered.
#[derive(Clone, Default)]
pub struct MockBroker {
    state: Arc<Mutex<MockState>>,
}

impl MockBroker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Expects a send to `topic`.
    pub fn expect_send(&self, topic: impl Into<String>) -> SendExpectationBuilder {
        SendExpectationBuilder {
            topic: topic.into(),
            state: self.state.clone(),
        }
    }

    /// Makes `connect` fail with `status`.
    pub fn refuse_connect(&self, status: BrokerStatus) {
        self.lock().connect_response = Some(status);
    }

    /// Makes `subscribe` fail with `status`.
    pub fn reject_subscribe(&self, status: BrokerStatus) {
        self.lock().subscribe_response = Some(status);
    }

    /// Pushes an inbound message into the session inbox.
    pub fn deliver(&self, envelope: Envelope) {
        self.lock().push(SessionDelivery::Message(envelope));
    }

    /// Raises a session event.
    pub fn emit(&self, event: SessionEvent) {
        self.lock().push(SessionDelivery::Event(event));
    }

    /// Envelopes the broker accepted.
    pub fn sent(&self) -> Vec<Envelope> {
        self.lock().sent.clone()
    }

    /// Every envelope handed to `send`, accepted or not.
    pub fn attempted(&self) -> Vec<Envelope> {
        self.lock().attempted.clone()
    }

    pub fn subscriptions(&self) -> Vec<TopicAddress> {
        self.lock().subscriptions.clone()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Properties of the last session created.
    pub fn properties(&self) -> Option<SessionProperties> {
        self.lock().properties.clone()
    }

    /// Verifies that all expectations were met.
    pub fn verify(&self) {
        let state = self.lock();
        if !state.expectations.is_empty() {
            let topics: Vec<&str> = state.expectations.iter().map(|e| e.topic.as_str()).collect();
            panic!("Not all send expectations were met. Remaining: {topics:?}");
        }
    }
}

/// Builder for `send` expectations.
pub struct SendExpectationBuilder {
    topic: String,
    state: Arc<Mutex<MockState>>,
}

impl SendExpectationBuilder {
    /// Sets the expectation to accept the send.
    pub fn return_ok(self) {
        self.register(Ok(()));
    }

    /// Sets the expectation to reject the send with `status`.
    pub fn return_err(self, status: BrokerStatus) {
        self.register(Err(status));
    }

    fn register(self, response: Result<(), BrokerStatus>) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.expectations.push_back(SendExpectation {
            topic: self.topic,
            response,
        });
    }
}

// =============================================================================
// BROKER IMPLEMENTATION
// =============================================================================

impl BrokerContext for MockBroker {
    fn create_session(&self, properties: SessionProperties) -> (Arc<dyn BrokerSession>, SessionInbox) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        {
            let mut state = self.lock();
            for delivery in state.pending.drain(..) {
                let _ = outbox.send(delivery);
            }
            state.properties = Some(properties);
            state.outbox = Some(outbox);
            state.connected = false;
            state.closed = false;
        }
        (Arc::new(MockSession { broker: self.clone() }), inbox)
    }
}

struct MockSession {
    broker: MockBroker,
}

#[async_trait]
impl BrokerSession for MockSession {
    async fn connect(&self) -> Result<(), BrokerStatus> {
        let mut state = self.broker.lock();
        if let Some(status) = state.connect_response {
            return Err(status);
        }
        state.connected = true;
        state.push(SessionDelivery::Event(SessionEvent::UpNotice));
        Ok(())
    }

    async fn subscribe(&self, pattern: &TopicAddress, confirm: bool) -> Result<(), BrokerStatus> {
        let mut state = self.broker.lock();
        if let Some(status) = state.subscribe_response {
            return Err(status);
        }
        if !state.connected {
            return Err(BrokerStatus::NotReady);
        }
        state.subscriptions.push(pattern.clone());
        if confirm {
            state.push(SessionDelivery::Event(SessionEvent::SubscriptionOk));
        }
        Ok(())
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), BrokerStatus> {
        let mut state = self.broker.lock();
        state.attempted.push(envelope.clone());

        let topic = envelope.topic();
        let scripted = state
            .expectations
            .iter()
            .position(|expectation| expectation.topic == topic)
            .and_then(|index| state.expectations.remove(index))
            .map(|expectation| expectation.response);

        let response = match scripted {
            Some(response) => response,
            None if state.closed => Err(BrokerStatus::Closed),
            None if !state.connected => Err(BrokerStatus::NotReady),
            None => Ok(()),
        };
        if response.is_ok() {
            state.sent.push(envelope.clone());
        }
        response
    }

    fn close(&self) {
        let mut state = self.broker.lock();
        state.closed = true;
        state.connected = false;
        state.outbox = None;
    }
}
