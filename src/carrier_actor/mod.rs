//! # Carrier Actor
//!
//! The driver. Subscribes to `PickupRequest/<driver>/*` and, for the first
//! pickup request, publishes four envelopes:
//!
//! 1. the direct reply, to the request's reply-to topic or
//!    `PickupRequestResponse/<ride>`;
//! 2. `PickupComplete/<ride>`;
//! 3. `DropoffComplete`, carrying the rider for settlement;
//! 4. `LocationUpdate/<driver>/AVAILABLE/<destination>`.
//!
//! Each send stands on its own: one failing does not hold back the others.

pub mod rule;

pub use rule::*;

use participant_framework::{
    Credentials, ParticipantActor, ParticipantHandle, ParticipantSettings, TopicError,
};

/// Creates a carrier actor for `driver_id`.
pub fn new(
    driver_id: &str,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<CarrierRule>, ParticipantHandle), TopicError> {
    let rule = CarrierRule::new(driver_id)?;
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}
