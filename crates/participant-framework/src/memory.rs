//! # In-Memory Broker
//!
//! An in-process [`BrokerContext`] for running whole rides without a real
//! message router. Every session created from the same `InMemoryBroker`
//! shares one routing table:
//!
//! - a send is delivered to every connected session whose subscriptions match
//!   the destination, in send order;
//! - sessions opened with `no_local` never see their own publications;
//! - connectivity can be degraded from the test side with
//!   [`InMemoryBroker::refuse_connections`], [`InMemoryBroker::lose_connections`]
//!   and [`InMemoryBroker::disconnect_all`];
//! - the most recent publications are kept for inspection, up to
//!   [`DEFAULT_PUBLISHED_LIMIT`] unless set with
//!   [`InMemoryBroker::with_published_limit`].

use crate::broker::{
    BrokerContext, BrokerSession, BrokerStatus, SessionDelivery, SessionEvent, SessionInbox,
    SessionProperties,
};
use crate::envelope::Envelope;
use crate::topic::{TopicAddress, TopicError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tokio::sync::mpsc;
use tracing::{debug, trace};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publications kept by [`InMemoryBroker::new`].
pub const DEFAULT_PUBLISHED_LIMIT: usize = 1024;

struct Router {
    sessions: Vec<Weak<MemorySession>>,
    next_id: u64,
    refuse: bool,
    published: VecDeque<Envelope>,
    published_limit: usize,
}

impl Default for Router {
    fn default() -> Self {
        Self {
            sessions: Vec::new(),
            next_id: 0,
            refuse: false,
            published: VecDeque::new(),
            published_limit: DEFAULT_PUBLISHED_LIMIT,
        }
    }
}

impl Router {
    fn record(&mut self, envelope: &Envelope) {
        if self.published_limit == 0 {
            return;
        }
        if self.published.len() == self.published_limit {
            self.published.pop_front();
        }
        self.published.push_back(envelope.clone());
    }

    fn live(&mut self) -> Vec<Arc<MemorySession>> {
        self.sessions.retain(|session| session.strong_count() > 0);
        self.sessions.iter().filter_map(Weak::upgrade).collect()
    }
}

/// Shared in-process broker. Clones route through the same table.
#[derive(Clone, Default)]
pub struct InMemoryBroker {
    router: Arc<Mutex<Router>>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps at most `limit` publications; `0` keeps none.
    pub fn with_published_limit(limit: usize) -> Self {
        let broker = Self::default();
        lock(&broker.router).published_limit = limit;
        broker
    }

    /// While set, every `connect` fails with `Refused`.
    pub fn refuse_connections(&self, refuse: bool) {
        lock(&self.router).refuse = refuse;
    }

    /// Drops every connected session, raising `Disconnected` on each.
    pub fn disconnect_all(&self) {
        let sessions = lock(&self.router).live();
        for session in sessions {
            if session.drop_connection() {
                session.notify(SessionEvent::Disconnected);
            }
        }
    }

    /// Simulates a network blip on every connected session.
    ///
    /// A recoverable loss raises `Reconnecting` then `Reconnected`; otherwise
    /// the session retries `reconnect_retries` times and ends with
    /// `ReconnectFailed`.
    pub fn lose_connections(&self, recoverable: bool) {
        let sessions = lock(&self.router).live();
        for session in sessions {
            if !session.is_connected() {
                continue;
            }
            if recoverable {
                session.notify(SessionEvent::Reconnecting);
                session.notify(SessionEvent::Reconnected);
                continue;
            }
            for _ in 0..session.properties.reconnect_retries.max(1) {
                session.notify(SessionEvent::Reconnecting);
            }
            session.drop_connection();
            session.notify(SessionEvent::ReconnectFailed);
        }
    }

    /// Sessions that exist and have not been closed.
    pub fn session_count(&self) -> usize {
        lock(&self.router)
            .live()
            .iter()
            .filter(|session| !session.is_closed())
            .count()
    }

    /// The most recent envelopes accepted for routing, in send order.
    pub fn published(&self) -> Vec<Envelope> {
        lock(&self.router).published.iter().cloned().collect()
    }

    pub fn clear_published(&self) {
        lock(&self.router).published.clear();
    }

    /// Published envelopes whose destination matches `pattern`.
    pub fn published_to(&self, pattern: &str) -> Result<Vec<Envelope>, TopicError> {
        let pattern = TopicAddress::parse(pattern)?;
        Ok(self
            .published()
            .into_iter()
            .filter(|envelope| pattern.matches(&envelope.destination))
            .collect())
    }

    fn route(&self, from: u64, envelope: &Envelope) {
        let sessions = {
            let mut router = lock(&self.router);
            router.record(envelope);
            router.live()
        };
        for session in sessions {
            if session.id == from && session.properties.no_local {
                continue;
            }
            if session.accepts(&envelope.destination) {
                trace!(session = session.id, topic = %envelope.destination, "Routing");
                session.push(SessionDelivery::Message(envelope.clone()));
            }
        }
    }
}

impl BrokerContext for InMemoryBroker {
    fn create_session(&self, properties: SessionProperties) -> (Arc<dyn BrokerSession>, SessionInbox) {
        let (outbox, inbox) = mpsc::unbounded_channel();
        let mut router = lock(&self.router);
        router.next_id += 1;
        let session = Arc::new(MemorySession {
            id: router.next_id,
            properties,
            broker: self.clone(),
            outbox,
            state: Mutex::new(SessionSlot::default()),
        });
        router.sessions.push(Arc::downgrade(&session));
        debug!(session = session.id, username = %session.properties.credentials.username, "Session created");
        (session, inbox)
    }
}

#[derive(Default)]
struct SessionSlot {
    connected: bool,
    closed: bool,
    subscriptions: Vec<TopicAddress>,
}

struct MemorySession {
    id: u64,
    properties: SessionProperties,
    broker: InMemoryBroker,
    outbox: mpsc::UnboundedSender<SessionDelivery>,
    state: Mutex<SessionSlot>,
}

impl MemorySession {
    fn push(&self, delivery: SessionDelivery) {
        // the receiver is gone once the participant stopped listening
        let _ = self.outbox.send(delivery);
    }

    fn notify(&self, event: SessionEvent) {
        self.push(SessionDelivery::Event(event));
    }

    fn is_connected(&self) -> bool {
        let slot = lock(&self.state);
        slot.connected && !slot.closed
    }

    fn is_closed(&self) -> bool {
        lock(&self.state).closed
    }

    fn drop_connection(&self) -> bool {
        let mut slot = lock(&self.state);
        let was_connected = slot.connected && !slot.closed;
        slot.connected = false;
        was_connected
    }

    fn accepts(&self, destination: &TopicAddress) -> bool {
        let slot = lock(&self.state);
        slot.connected
            && !slot.closed
            && slot.subscriptions.iter().any(|pattern| pattern.matches(destination))
    }
}

#[async_trait]
impl BrokerSession for MemorySession {
    async fn connect(&self) -> Result<(), BrokerStatus> {
        if lock(&self.broker.router).refuse {
            return Err(BrokerStatus::Refused);
        }
        {
            let mut slot = lock(&self.state);
            if slot.closed {
                return Err(BrokerStatus::Closed);
            }
            slot.connected = true;
        }
        self.notify(SessionEvent::UpNotice);
        Ok(())
    }

    async fn subscribe(&self, pattern: &TopicAddress, confirm: bool) -> Result<(), BrokerStatus> {
        {
            let mut slot = lock(&self.state);
            if !slot.connected || slot.closed {
                return Err(BrokerStatus::NotReady);
            }
            if !slot.subscriptions.contains(pattern) {
                slot.subscriptions.push(pattern.clone());
            }
        }
        if confirm {
            self.notify(SessionEvent::SubscriptionOk);
        }
        Ok(())
    }

    async fn send(&self, envelope: &Envelope) -> Result<(), BrokerStatus> {
        {
            let slot = lock(&self.state);
            if slot.closed {
                return Err(BrokerStatus::Closed);
            }
            if !slot.connected {
                return Err(BrokerStatus::NotReady);
            }
        }
        self.broker.route(self.id, envelope);
        Ok(())
    }

    fn close(&self) {
        let mut slot = lock(&self.state);
        if !slot.closed {
            slot.closed = true;
            slot.connected = false;
            debug!(session = self.id, "Session closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::Credentials;

    fn properties(username: &str, no_local: bool) -> SessionProperties {
        SessionProperties {
            credentials: Credentials::new("tcp://localhost:55555", "vpn", username, ""),
            reconnect_retries: 2,
            no_local,
        }
    }

    fn topic(s: &str) -> TopicAddress {
        TopicAddress::parse(s).unwrap()
    }

    async fn next_message(inbox: &mut SessionInbox) -> Envelope {
        loop {
            match inbox.recv().await.expect("inbox closed") {
                SessionDelivery::Message(envelope) => return envelope,
                SessionDelivery::Event(_) => continue,
            }
        }
    }

    #[tokio::test]
    async fn test_routes_by_subscription() {
        let broker = InMemoryBroker::new();
        let (a, mut a_inbox) = broker.create_session(properties("a", false));
        let (b, _b_inbox) = broker.create_session(properties("b", false));

        a.connect().await.unwrap();
        b.connect().await.unwrap();
        a.subscribe(&topic("PaymentRequest/U1/*"), true).await.unwrap();

        assert_eq!(a_inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::UpNotice)));
        assert_eq!(
            a_inbox.recv().await,
            Some(SessionDelivery::Event(SessionEvent::SubscriptionOk))
        );

        b.send(&Envelope::new(topic("PaymentRequest/U2"), b"x".to_vec())).await.unwrap();
        b.send(&Envelope::new(topic("PaymentRequest/U1"), b"y".to_vec())).await.unwrap();

        let received = next_message(&mut a_inbox).await;
        assert_eq!(received.payload, b"y".to_vec());
        assert_eq!(broker.published().len(), 2);
        assert_eq!(broker.published_to("PaymentRequest/U1/*").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_local_suppresses_echo() {
        let broker = InMemoryBroker::new();
        let (quiet, mut quiet_inbox) = broker.create_session(properties("quiet", true));
        let (loud, mut loud_inbox) = broker.create_session(properties("loud", false));

        for session in [&quiet, &loud] {
            session.connect().await.unwrap();
            session.subscribe(&topic("PaymentRequest/*"), false).await.unwrap();
        }

        quiet.send(&Envelope::new(topic("PaymentRequest/U1"), b"1".to_vec())).await.unwrap();
        loud.send(&Envelope::new(topic("PaymentRequest/U1"), b"2".to_vec())).await.unwrap();

        // quiet only sees loud's publication
        assert_eq!(next_message(&mut quiet_inbox).await.payload, b"2".to_vec());
        assert_eq!(next_message(&mut loud_inbox).await.payload, b"1".to_vec());
        assert_eq!(next_message(&mut loud_inbox).await.payload, b"2".to_vec());
    }

    #[tokio::test]
    async fn test_refused_and_closed_sessions() {
        let broker = InMemoryBroker::new();
        broker.refuse_connections(true);
        let (session, _inbox) = broker.create_session(properties("a", false));
        assert_eq!(session.connect().await, Err(BrokerStatus::Refused));
        assert_eq!(
            session.send(&Envelope::new(topic("t"), Vec::new())).await,
            Err(BrokerStatus::NotReady)
        );

        broker.refuse_connections(false);
        session.connect().await.unwrap();
        assert_eq!(broker.session_count(), 1);

        session.close();
        session.close();
        assert_eq!(broker.session_count(), 0);
        assert_eq!(
            session.send(&Envelope::new(topic("t"), Vec::new())).await,
            Err(BrokerStatus::Closed)
        );
    }

    #[tokio::test]
    async fn test_publication_log_is_bounded() {
        let broker = InMemoryBroker::with_published_limit(2);
        let (session, _inbox) = broker.create_session(properties("a", false));
        session.connect().await.unwrap();

        for payload in [b"1", b"2", b"3"] {
            session.send(&Envelope::new(topic("t"), payload.to_vec())).await.unwrap();
        }
        let kept: Vec<Vec<u8>> = broker.published().into_iter().map(|envelope| envelope.payload).collect();
        assert_eq!(kept, vec![b"2".to_vec(), b"3".to_vec()]);

        broker.clear_published();
        assert!(broker.published().is_empty());
        session.send(&Envelope::new(topic("t"), b"4".to_vec())).await.unwrap();
        assert_eq!(broker.published_to("t").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_connection_loss_events() {
        let broker = InMemoryBroker::new();
        let (session, mut inbox) = broker.create_session(properties("a", false));
        session.connect().await.unwrap();
        assert_eq!(inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::UpNotice)));

        broker.lose_connections(true);
        assert_eq!(inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::Reconnecting)));
        assert_eq!(inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::Reconnected)));

        broker.lose_connections(false);
        assert_eq!(inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::Reconnecting)));
        assert_eq!(inbox.recv().await, Some(SessionDelivery::Event(SessionEvent::Reconnecting)));
        assert_eq!(
            inbox.recv().await,
            Some(SessionDelivery::Event(SessionEvent::ReconnectFailed))
        );

        // nothing left to disconnect
        broker.disconnect_all();
        assert!(inbox.try_recv().is_err());
    }
}
