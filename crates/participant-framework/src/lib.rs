//! # Participant Framework
//!
//! Building blocks for message-driven participants that talk to each other
//! only through a topic-based publish/subscribe broker. Every participant runs
//! the same generic actor; what differs between roles is a small
//! [`CorrelationRule`] that maps an inbound message to the envelopes it
//! should produce.
//!
//! ## Architecture Overview
//!
//! 1. **Rule Layer** ([`CorrelationRule`]) - identity, subscription, pre-work and
//!    the inbound-to-outbound mapping of one role.
//! 2. **Runtime Layer** ([`ParticipantActor`]) - session ownership, the
//!    [`SessionLifecycle`] state machine and the single [`ReleaseLatch`] wait.
//! 3. **Broker Layer** ([`BrokerContext`], [`BrokerSession`]) - the external
//!    collaborator. [`memory::InMemoryBroker`] and [`mock::MockBroker`] ship
//!    with the crate.
//! 4. **Observation** ([`ParticipantHandle`]) - state, release reason, the
//!    error journal and delivery counters of a running participant.
//!
//! ## Addressing
//!
//! Topics are `/`-separated [`TopicAddress`]es. A trailing `*` subscribes to a
//! prefix and everything below it. Replies travel on the envelope's
//! `reply_to` topic; see [`Envelope::reply`].
//!
//! ## Error Handling
//!
//! [`ParticipantError`] separates fatal errors (configuration, connection,
//! subscription), which end `run()`, from send and processing errors, which
//! are logged, journaled and skipped.

pub mod actor;
pub mod broker;
pub mod envelope;
pub mod error;
pub mod handle;
pub mod latch;
pub mod lifecycle;
pub mod memory;
pub mod mock;
pub mod rule;
pub mod topic;
pub mod tracing;

pub use actor::{ParticipantActor, ParticipantSettings, RunOutcome};
pub use broker::{
    BrokerContext, BrokerSession, BrokerStatus, Credentials, SessionDelivery, SessionEvent,
    SessionInbox, SessionProperties, DEFAULT_RECONNECT_RETRIES,
};
pub use envelope::Envelope;
pub use error::{ErrorKind, ParticipantError, ReportedError};
pub use handle::ParticipantHandle;
pub use latch::{Release, ReleaseLatch};
pub use lifecycle::{InvalidTransition, SessionLifecycle, SessionState};
pub use rule::{CorrelationRule, Identity, Outbound, Termination};
pub use topic::{Segment, TopicAddress, TopicError};
