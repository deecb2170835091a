//! # Requester Actor
//!
//! The rider. A requester runs in one of two stages, see [`RequesterStage`]:
//!
//! - asking for a ride: publishes a [`RideRequest`](crate::model::RideRequest)
//!   to `taxi/requests` right after subscribing to `RideRequestResponse/<user>/*`,
//!   and stops at the dispatcher's answer;
//! - waiting to be billed: subscribes to `PaymentRequest/<user>/*` and stops at
//!   the first payment request.
//!
//! ## Usage
//!
//! ```rust
//! use participant_framework::memory::InMemoryBroker;
//! use participant_framework::{Credentials, ParticipantSettings, SessionState};
//! use taxi_call::requester_actor;
//!
//! #[tokio::main]
//! async fn main() {
//!     let broker = InMemoryBroker::new();
//!     let credentials = Credentials::new("tcp://localhost:55555", "default", "rider", "");
//!     let (actor, handle) =
//!         requester_actor::billing("U1", credentials, ParticipantSettings::default()).unwrap();
//!
//!     tokio::spawn(actor.run(broker.clone()));
//!     handle.wait_for_state(SessionState::AwaitingTerminalEvent).await;
//!     assert!(!handle.is_released());
//! }
//! ```

pub mod rule;

pub use rule::*;

use participant_framework::{
    Credentials, ParticipantActor, ParticipantHandle, ParticipantSettings, TopicError,
};

/// Creates a requester that asks for a ride.
pub fn new(
    user_id: &str,
    current_location: &str,
    destination: &str,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<RequesterRule>, ParticipantHandle), TopicError> {
    let rule = RequesterRule::ride(user_id, current_location, destination)?;
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}

/// Creates a requester that waits for its bill.
pub fn billing(
    user_id: &str,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<RequesterRule>, ParticipantHandle), TopicError> {
    let rule = RequesterRule::billing(user_id)?;
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}
