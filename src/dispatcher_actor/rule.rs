use crate::error::RideError;
use crate::model::{PickupRequest, RideRequest, RideRequestResponse, Role};
use crate::topics;
use chrono::Utc;
use participant_framework::{CorrelationRule, Envelope, Identity, Outbound, TopicAddress, TopicError};
use tracing::{info, warn};
use uuid::Uuid;

/// The taxi a dispatcher hands out.
#[derive(Debug, Clone, PartialEq)]
pub struct Fleet {
    pub driver_id: String,
    pub taxi_number: String,
    pub eta: String,
}

#[derive(Debug)]
pub struct DispatcherRule {
    identity: Identity,
    fleet: Fleet,
    dispatch_pickups: bool,
}

impl DispatcherRule {
    pub fn new(operator_id: &str, fleet: Fleet) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Dispatcher.as_str(), operator_id)?,
            fleet,
            dispatch_pickups: false,
        })
    }

    /// Also sends a pickup request to the fleet's driver for every accepted ride.
    pub fn dispatch_pickups(mut self, enabled: bool) -> Self {
        self.dispatch_pickups = enabled;
        self
    }

    fn accept(&self, request: &RideRequest, inbound: &Envelope) -> Result<Vec<Envelope>, RideError> {
        let ride_id = Uuid::new_v4();
        let response = RideRequestResponse::success(
            ride_id,
            self.fleet.eta.as_str(),
            self.fleet.taxi_number.as_str(),
            self.fleet.driver_id.as_str(),
        );
        let fallback = topics::ride_response(&request.user_id)?;
        let mut outbound = vec![Envelope::reply(inbound, fallback, serde_json::to_vec(&response)?)];

        if self.dispatch_pickups {
            let pickup = PickupRequest {
                timestamp: Utc::now(),
                ride_id,
                user_id: request.user_id.clone(),
                driver_id: self.fleet.driver_id.clone(),
                location: request.current_location.clone(),
                destination: request.destination.clone(),
            };
            let destination = topics::pickup_request(&self.fleet.driver_id, ride_id)?;
            outbound.push(
                Envelope::json(destination, &pickup)?.with_reply_to(topics::pickup_response(ride_id)?),
            );
        }

        info!(
            operator_id = %self.identity.id(),
            user_id = %request.user_id,
            %ride_id,
            driver_id = %self.fleet.driver_id,
            "Ride assigned"
        );
        Ok(outbound)
    }
}

impl CorrelationRule for DispatcherRule {
    type Inbound = RideRequest;
    type Error = RideError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn subscription(&self) -> Result<TopicAddress, TopicError> {
        topics::subscription_pattern(Role::Dispatcher, self.identity.id())
    }

    fn correlate(&self, request: RideRequest, inbound: &Envelope) -> Result<Outbound<RideError>, RideError> {
        if request.is_serviceable() {
            return Ok(self.accept(&request, inbound)?.into());
        }
        warn!(
            user_id = %request.user_id,
            current_location = %request.current_location,
            destination = %request.destination,
            "Ride request cannot be served"
        );
        let fallback = topics::ride_response(&request.user_id)?;
        let body = serde_json::to_vec(&RideRequestResponse::declined())?;
        Ok(vec![Envelope::reply(inbound, fallback, body)].into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RideResult;

    fn fleet() -> Fleet {
        Fleet {
            driver_id: "D1".into(),
            taxi_number: "1234".into(),
            eta: "5 minutes".into(),
        }
    }

    fn request(body: &str) -> Envelope {
        Envelope::new(topics::ride_requests().unwrap(), body.as_bytes().to_vec())
    }

    #[test]
    fn test_single_success_reply_by_default() {
        let rule = DispatcherRule::new("OP1", fleet()).unwrap();
        let inbound = request(r#"{"UserID":"U1","CurrentLocation":"A","Destination":"B"}"#);

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].topic(), "RideRequestResponse/U1");

        let response: RideRequestResponse = outbound[0].decode().unwrap();
        assert_eq!(response.result, RideResult::Success);
        assert_eq!(response.taxi_number.as_deref(), Some("1234"));
        assert_eq!(response.driver_id.as_deref(), Some("D1"));
    }

    #[test]
    fn test_pickup_request_follows_the_response() {
        let rule = DispatcherRule::new("OP1", fleet()).unwrap().dispatch_pickups(true);
        let inbound = request(r#"{"UserID":"U1","CurrentLocation":"A","Destination":"B"}"#);

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 2);

        let response: RideRequestResponse = outbound[0].decode().unwrap();
        let ride_id = response.ride_id.unwrap();
        assert_eq!(outbound[1].topic(), format!("PickupRequest/D1/{ride_id}"));
        assert_eq!(
            outbound[1].reply_to.as_ref().map(TopicAddress::render),
            Some(format!("PickupRequestResponse/{ride_id}"))
        );

        let pickup: PickupRequest = outbound[1].decode().unwrap();
        assert_eq!(pickup.user_id, "U1");
        assert_eq!(pickup.location, "A");
        assert_eq!(pickup.destination, "B");
    }

    #[test]
    fn test_unserviceable_request_is_declined() {
        let rule = DispatcherRule::new("OP1", fleet()).unwrap().dispatch_pickups(true);
        let inbound = request(r#"{"UserID":"U1","CurrentLocation":"","Destination":"B"}"#)
            .with_reply_to(TopicAddress::parse("RideRequestResponse/U1").unwrap());

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].in_reply_to, Some(inbound.destination.clone()));
        let response: RideRequestResponse = outbound[0].decode().unwrap();
        assert_eq!(response.result, RideResult::Declined);
    }

    #[test]
    fn test_unaddressable_destination_is_declined() {
        let rule = DispatcherRule::new("OP1", fleet()).unwrap().dispatch_pickups(true);
        let inbound = request(r#"{"UserID":"U1","CurrentLocation":"A","Destination":"Main St/5th Ave"}"#);

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].topic(), "RideRequestResponse/U1");
        let response: RideRequestResponse = outbound[0].decode().unwrap();
        assert_eq!(response.result, RideResult::Declined);
    }

    #[test]
    fn test_user_id_must_be_addressable() {
        let rule = DispatcherRule::new("OP1", fleet()).unwrap();
        let inbound = request(r#"{"UserID":"U/1","CurrentLocation":"A","Destination":"B"}"#);
        let result = rule.correlate(inbound.decode().unwrap(), &inbound);
        assert!(matches!(result, Err(RideError::Topic(TopicError::InvalidIdentifier(_)))));
    }
}
