//! # Ledger Actor
//!
//! The billing company. Subscribes to `PaymentRequest/*` and re-addresses each
//! payment request to `PaymentRequest/<user>` as its acknowledgement.
//!
//! The forward lands on a topic the ledger itself listens on, so its session is
//! always opened with `no_local`; the payer may still see the request twice
//! (once from settlement, once from the ledger).

pub mod rule;

pub use rule::*;

use participant_framework::{
    Credentials, ParticipantActor, ParticipantHandle, ParticipantSettings, TopicError,
};

/// Creates a ledger actor. `no_local` is forced on.
pub fn new(
    ledger_id: &str,
    credentials: Credentials,
    settings: ParticipantSettings,
) -> Result<(ParticipantActor<LedgerRule>, ParticipantHandle), TopicError> {
    let rule = LedgerRule::new(ledger_id)?;
    let settings = ParticipantSettings {
        no_local: true,
        ..settings
    };
    Ok(ParticipantActor::with_settings(rule, credentials, settings))
}
