use crate::error::RideError;
use crate::model::{PaymentRequest, RideRequest, RideRequestResponse, RideResult, Role};
use crate::topics;
use chrono::Utc;
use participant_framework::{
    CorrelationRule, Envelope, Identity, Outbound, Termination, TopicAddress, TopicError,
};
use serde::Deserialize;
use tracing::{info, warn};

/// What the requester is currently waiting for.
#[derive(Debug, Clone, PartialEq)]
pub enum RequesterStage {
    /// Publishes `request` once subscribed and waits for the dispatcher's answer.
    AwaitRideResponse { request: RideRequest },
    /// Waits for the bill of a finished ride.
    AwaitPaymentRequest,
}

/// Anything a requester can be sent. Each stage accepts only its own kind.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RequesterInbound {
    Ride(RideRequestResponse),
    Payment(PaymentRequest),
}

impl RequesterInbound {
    fn kind(&self) -> &'static str {
        match self {
            RequesterInbound::Ride(_) => "ride response",
            RequesterInbound::Payment(_) => "payment request",
        }
    }
}

#[derive(Debug)]
pub struct RequesterRule {
    identity: Identity,
    stage: RequesterStage,
}

impl RequesterRule {
    /// A rider asking for a ride from `current_location` to `destination`.
    pub fn ride(
        user_id: &str,
        current_location: impl Into<String>,
        destination: impl Into<String>,
    ) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Requester.as_str(), user_id)?,
            stage: RequesterStage::AwaitRideResponse {
                request: RideRequest::new(user_id, current_location, destination),
            },
        })
    }

    /// A rider waiting to be billed.
    pub fn billing(user_id: &str) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Requester.as_str(), user_id)?,
            stage: RequesterStage::AwaitPaymentRequest,
        })
    }
}

impl CorrelationRule for RequesterRule {
    type Inbound = RequesterInbound;
    type Error = RideError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn subscription(&self) -> Result<TopicAddress, TopicError> {
        match self.stage {
            RequesterStage::AwaitRideResponse { .. } => {
                topics::subscription_pattern(Role::Requester, self.identity.id())
            }
            RequesterStage::AwaitPaymentRequest => topics::payment_requests_for(self.identity.id()),
        }
    }

    fn termination(&self) -> Termination {
        Termination::OnFirstReply
    }

    fn on_subscribed(&self) -> Result<Vec<Envelope>, RideError> {
        let RequesterStage::AwaitRideResponse { request } = &self.stage else {
            return Ok(Vec::new());
        };
        let request = RideRequest {
            timestamp: Utc::now(),
            ..request.clone()
        };
        let envelope = Envelope::json(topics::ride_requests()?, &request)?
            .with_reply_to(topics::ride_response(self.identity.id())?);
        Ok(vec![envelope])
    }

    fn correlate(&self, inbound: RequesterInbound, envelope: &Envelope) -> Result<Outbound<RideError>, RideError> {
        let expected = match self.stage {
            RequesterStage::AwaitRideResponse { .. } => "ride response",
            RequesterStage::AwaitPaymentRequest => "payment request",
        };
        if inbound.kind() != expected {
            return Err(RideError::UnexpectedMessage {
                expected,
                received: inbound.kind(),
            });
        }

        match inbound {
            RequesterInbound::Ride(response) if response.result == RideResult::Success => info!(
                user_id = %self.identity.id(),
                ride_id = ?response.ride_id,
                eta = ?response.eta,
                taxi_number = ?response.taxi_number,
                "Ride confirmed"
            ),
            RequesterInbound::Ride(response) => warn!(
                user_id = %self.identity.id(),
                result = %response.result,
                "Ride not confirmed"
            ),
            RequesterInbound::Payment(payment) => info!(
                user_id = %self.identity.id(),
                ride_id = %payment.ride_id,
                cost = payment.cost,
                topic = %envelope.destination,
                "Payment requested"
            ),
        }
        Ok(Outbound::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_ride_stage_publishes_request_with_reply_to() {
        let rule = RequesterRule::ride("U1", "LocationA", "LocationB").unwrap();
        assert_eq!(rule.subscription().unwrap().render(), "RideRequestResponse/U1/*");

        let envelopes = rule.on_subscribed().unwrap();
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].topic(), "taxi/requests");
        assert_eq!(
            envelopes[0].reply_to.as_ref().map(TopicAddress::render),
            Some("RideRequestResponse/U1".to_string())
        );
        let request: RideRequest = envelopes[0].decode().unwrap();
        assert_eq!(request.current_location, "LocationA");
    }

    #[test]
    fn test_billing_stage_waits_silently() {
        let rule = RequesterRule::billing("U1").unwrap();
        assert_eq!(rule.subscription().unwrap().render(), "PaymentRequest/U1/*");
        assert!(rule.on_subscribed().unwrap().is_empty());
        assert_eq!(rule.termination(), Termination::OnFirstReply);
    }

    #[test]
    fn test_inbound_schemas_are_told_apart() {
        let ride_id = Uuid::new_v4();
        let payment = format!(r#"{{"RideID":"{ride_id}","UserID":"U1","Cost":50}}"#);
        let inbound: RequesterInbound = serde_json::from_str(&payment).unwrap();
        assert!(matches!(inbound, RequesterInbound::Payment(p) if p.cost == 50));

        let ride = r#"{"Result":"DECLINED"}"#;
        let inbound: RequesterInbound = serde_json::from_str(ride).unwrap();
        assert!(matches!(inbound, RequesterInbound::Ride(r) if r.result == RideResult::Declined));

        assert!(serde_json::from_str::<RequesterInbound>(r#"{"Cost":"free"}"#).is_err());
    }

    #[test]
    fn test_each_stage_rejects_the_other_kind() {
        let payment = Envelope::json(
            topics::ride_response("U1").unwrap(),
            &PaymentRequest::new(Uuid::new_v4(), "U1", 50),
        )
        .unwrap();
        let rider = RequesterRule::ride("U1", "A", "B").unwrap();
        let result = rider.correlate(payment.decode().unwrap(), &payment);
        assert!(matches!(
            result,
            Err(RideError::UnexpectedMessage {
                expected: "ride response",
                received: "payment request"
            })
        ));

        let answer = Envelope::json(
            topics::payment_request("U1").unwrap(),
            &RideRequestResponse::declined(),
        )
        .unwrap();
        let billing = RequesterRule::billing("U1").unwrap();
        assert!(billing.correlate(answer.decode().unwrap(), &answer).is_err());
        assert!(rider.correlate(answer.decode().unwrap(), &answer).unwrap().is_empty());
    }

    #[test]
    fn test_blank_user_is_rejected() {
        assert!(RequesterRule::ride(" ", "A", "B").is_err());
        assert!(RequesterRule::billing("U/1").is_err());
    }
}
