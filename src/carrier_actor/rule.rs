use crate::error::RideError;
use crate::model::{
    DriverStatus, DropoffComplete, LocationUpdate, PickupComplete, PickupRequest, PickupResponse, Role,
};
use crate::topics;
use chrono::Utc;
use participant_framework::{
    CorrelationRule, Envelope, Identity, Outbound, Termination, TopicAddress, TopicError,
};
use tracing::info;

#[derive(Debug)]
pub struct CarrierRule {
    identity: Identity,
}

impl CarrierRule {
    pub fn new(driver_id: &str) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Carrier.as_str(), driver_id)?,
        })
    }
}

impl CorrelationRule for CarrierRule {
    type Inbound = PickupRequest;
    type Error = RideError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn subscription(&self) -> Result<TopicAddress, TopicError> {
        topics::subscription_pattern(Role::Carrier, self.identity.id())
    }

    fn termination(&self) -> Termination {
        Termination::OnFirstReply
    }

    /// Answers the pickup request, then reports the whole trip: pickup,
    /// dropoff and the driver being available again at the destination.
    ///
    /// A destination that cannot be addressed only loses the location update.
    fn correlate(&self, request: PickupRequest, inbound: &Envelope) -> Result<Outbound<RideError>, RideError> {
        let driver_id = self.identity.id();
        let ride_id = request.ride_id;
        let now = Utc::now();
        info!(%driver_id, %ride_id, user_id = %request.user_id, "Pickup accepted");

        let reply = PickupResponse {
            timestamp: now,
            ride_id,
            location: request.location.clone(),
        };
        let pickup = PickupComplete {
            timestamp: now,
            ride_id,
            location: request.location.clone(),
        };
        let dropoff = DropoffComplete {
            timestamp: now,
            ride_id,
            location: request.destination.clone(),
            user_id: request.user_id.clone(),
        };
        let update = LocationUpdate {
            timestamp: now,
            driver_id: driver_id.to_string(),
            location: request.destination.clone(),
            status: DriverStatus::Available,
        };

        let mut outbound = Outbound::new();
        outbound.push(Envelope::reply(
            inbound,
            topics::pickup_response(ride_id)?,
            serde_json::to_vec(&reply)?,
        ));
        outbound.push(Envelope::json(topics::pickup_complete(ride_id)?, &pickup)?);
        outbound.push(Envelope::json(topics::dropoff_complete()?, &dropoff)?);
        outbound.push_result(
            topics::location_update(driver_id, update.status, &update.location)
                .map_err(RideError::from)
                .and_then(|topic| Envelope::json(topic, &update).map_err(RideError::from)),
        );
        Ok(outbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn pickup_envelope(ride_id: Uuid, destination: &str) -> Envelope {
        let request = PickupRequest {
            timestamp: Utc::now(),
            ride_id,
            user_id: "U1".into(),
            driver_id: "D1".into(),
            location: "LocationA".into(),
            destination: destination.into(),
        };
        Envelope::json(topics::pickup_request("D1", ride_id).unwrap(), &request).unwrap()
    }

    #[test]
    fn test_four_envelopes_in_trip_order() {
        let rule = CarrierRule::new("D1").unwrap();
        let ride_id = Uuid::new_v4();
        let inbound = pickup_envelope(ride_id, "LocationB")
            .with_reply_to(topics::pickup_response(ride_id).unwrap());

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        let destinations: Vec<String> = outbound.iter().map(Envelope::topic).collect();
        assert_eq!(
            destinations,
            vec![
                format!("PickupRequestResponse/{ride_id}"),
                format!("PickupComplete/{ride_id}"),
                "DropoffComplete".to_string(),
                "LocationUpdate/D1/AVAILABLE/LocationB".to_string(),
            ]
        );
        assert_eq!(outbound[0].in_reply_to, Some(inbound.destination.clone()));

        let dropoff: DropoffComplete = outbound[2].decode().unwrap();
        assert_eq!(dropoff.user_id, "U1");
        assert_eq!(dropoff.location, "LocationB");
    }

    #[test]
    fn test_reply_falls_back_without_reply_to() {
        let rule = CarrierRule::new("D1").unwrap();
        let ride_id = Uuid::new_v4();
        let inbound = pickup_envelope(ride_id, "LocationB");

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound[0].topic(), format!("PickupRequestResponse/{ride_id}"));
        assert_eq!(rule.termination(), Termination::OnFirstReply);
    }

    #[test]
    fn test_unaddressable_destination_only_drops_location_update() {
        let rule = CarrierRule::new("D1").unwrap();
        let ride_id = Uuid::new_v4();
        let inbound = pickup_envelope(ride_id, "Main St/5th Ave");

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        let destinations: Vec<String> = outbound.iter().map(Envelope::topic).collect();
        assert_eq!(
            destinations,
            vec![
                format!("PickupRequestResponse/{ride_id}"),
                format!("PickupComplete/{ride_id}"),
                "DropoffComplete".to_string(),
            ]
        );
        assert!(matches!(
            outbound.failures(),
            [RideError::Topic(TopicError::InvalidIdentifier(location))] if location == "Main St/5th Ave"
        ));

        let dropoff: DropoffComplete = outbound[2].decode().unwrap();
        assert_eq!(dropoff.location, "Main St/5th Ave");
    }
}
