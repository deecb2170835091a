//! # Dispatcher Actor
//!
//! The platform operator. Listens on `taxi/requests` and answers every ride
//! request on `RideRequestResponse/<user>` with the ride id, ETA, taxi number
//! and driver of its [`Fleet`]. Requests missing a pickup location or a
//! destination are declined.
//!
//! With pickup dispatch enabled, an accepted ride also produces a pickup
//! request on `PickupRequest/<driver>/<ride>` whose replies go to
//! `PickupRequestResponse/<ride>`.
//!
//! The dispatcher serves requests until its session ends.

pub mod rule;

pub use rule::*;

use participant_framework::{
    Credentials, ParticipantActor, ParticipantHandle, ParticipantSettings, TopicError,
};

/// Creates a dispatcher actor.
pub fn new(
    operator_id: &str,
    fleet: Fleet,
    dispatch_pickups: bool,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<DispatcherRule>, ParticipantHandle), TopicError> {
    let rule = DispatcherRule::new(operator_id, fleet)?.dispatch_pickups(dispatch_pickups);
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}
