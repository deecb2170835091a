//! # Settlement Actor
//!
//! The payment processor. Subscribes to `DropoffComplete` and turns every
//! finished ride into a [`PaymentRequest`](crate::model::PaymentRequest) on
//! `PaymentRequest/<user>`. The amount is a configured flat fare.
//!
//! Settlement keeps billing until its session ends.

pub mod rule;

pub use rule::*;

use participant_framework::{
    Credentials, ParticipantActor, ParticipantHandle, ParticipantSettings, TopicError,
};

/// Creates a settlement actor charging `fare` per ride.
pub fn new(
    settlement_id: &str,
    fare: u32,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<SettlementRule>, ParticipantHandle), TopicError> {
    let rule = SettlementRule::new(settlement_id, fare)?;
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}
