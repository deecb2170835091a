//! # Ride Topics
//!
//! Every topic the ride participants publish on or subscribe to. Identifiers
//! become literal segments, so an identifier that is blank, contains `/` or is
//! `*` fails with [`TopicError::InvalidIdentifier`].
//!
//! | Topic | Publisher | Subscriber |
//! |-------|-----------|------------|
//! | `taxi/requests` | requester | dispatcher |
//! | `RideRequestResponse/<user>` | dispatcher | requester |
//! | `PickupRequest/<driver>/<ride>` | dispatcher | carrier |
//! | `PickupRequestResponse/<ride>` | carrier | - |
//! | `PickupComplete/<ride>` | carrier | - |
//! | `DropoffComplete` | carrier | settlement |
//! | `LocationUpdate/<driver>/<status>/<location>` | carrier | - |
//! | `PaymentRequest/<payer>` | settlement, ledger | ledger, requester |

use crate::model::{DriverStatus, Role};
use participant_framework::{TopicAddress, TopicError};
use uuid::Uuid;

pub const RIDE_REQUESTS: &str = "taxi/requests";
pub const RIDE_REQUEST_RESPONSE: &str = "RideRequestResponse";
pub const PICKUP_REQUEST: &str = "PickupRequest";
pub const PICKUP_REQUEST_RESPONSE: &str = "PickupRequestResponse";
pub const PICKUP_COMPLETE: &str = "PickupComplete";
pub const DROPOFF_COMPLETE: &str = "DropoffComplete";
pub const LOCATION_UPDATE: &str = "LocationUpdate";
pub const PAYMENT_REQUEST: &str = "PaymentRequest";

pub fn ride_requests() -> Result<TopicAddress, TopicError> {
    TopicAddress::parse(RIDE_REQUESTS)
}

pub fn ride_response(user_id: &str) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(RIDE_REQUEST_RESPONSE)?.segment(user_id)
}

pub fn pickup_request(driver_id: &str, ride_id: Uuid) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(PICKUP_REQUEST)?
        .segment(driver_id)?
        .segment(ride_id.to_string())
}

pub fn pickup_response(ride_id: Uuid) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(PICKUP_REQUEST_RESPONSE)?.segment(ride_id.to_string())
}

pub fn pickup_complete(ride_id: Uuid) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(PICKUP_COMPLETE)?.segment(ride_id.to_string())
}

pub fn dropoff_complete() -> Result<TopicAddress, TopicError> {
    TopicAddress::root(DROPOFF_COMPLETE)
}

pub fn location_update(
    driver_id: &str,
    status: DriverStatus,
    location: &str,
) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(LOCATION_UPDATE)?
        .segment(driver_id)?
        .segment(status.as_str())?
        .segment(location)
}

pub fn payment_request(payer_id: &str) -> Result<TopicAddress, TopicError> {
    TopicAddress::root(PAYMENT_REQUEST)?.segment(payer_id)
}

/// Payment requests addressed to one payer.
pub fn payment_requests_for(payer_id: &str) -> Result<TopicAddress, TopicError> {
    Ok(payment_request(payer_id)?.wildcard())
}

/// Payment requests for every payer.
pub fn all_payment_requests() -> Result<TopicAddress, TopicError> {
    Ok(TopicAddress::root(PAYMENT_REQUEST)?.wildcard())
}

/// The pattern a participant of `role` acting as `id` subscribes to.
///
/// The requester listens for its ride response here; while waiting for a bill
/// it uses [`payment_requests_for`] instead.
pub fn subscription_pattern(role: Role, id: &str) -> Result<TopicAddress, TopicError> {
    match role {
        Role::Requester => Ok(ride_response(id)?.wildcard()),
        Role::Dispatcher => ride_requests(),
        Role::Carrier => Ok(TopicAddress::root(PICKUP_REQUEST)?.segment(id)?.wildcard()),
        Role::Settlement => dropoff_complete(),
        Role::Ledger => all_payment_requests(),
    }
}
