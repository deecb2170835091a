use crate::error::RideError;
use crate::model::{DropoffComplete, PaymentRequest, Role};
use crate::topics;
use participant_framework::{CorrelationRule, Envelope, Identity, Outbound, TopicAddress, TopicError};
use tracing::info;

/// Bills every finished ride at a flat fare.
#[derive(Debug)]
pub struct SettlementRule {
    identity: Identity,
    fare: u32,
}

impl SettlementRule {
    pub fn new(settlement_id: &str, fare: u32) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Settlement.as_str(), settlement_id)?,
            fare,
        })
    }
}

impl CorrelationRule for SettlementRule {
    type Inbound = DropoffComplete;
    type Error = RideError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn subscription(&self) -> Result<TopicAddress, TopicError> {
        topics::subscription_pattern(Role::Settlement, self.identity.id())
    }

    fn correlate(&self, dropoff: DropoffComplete, _inbound: &Envelope) -> Result<Outbound<RideError>, RideError> {
        let payment = PaymentRequest::new(dropoff.ride_id, dropoff.user_id.as_str(), self.fare);
        let destination = topics::payment_request(&dropoff.user_id)?;
        info!(user_id = %dropoff.user_id, ride_id = %dropoff.ride_id, cost = self.fare, "Billing ride");
        Ok(vec![Envelope::json(destination, &payment)?].into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_bills_the_rider_named_in_the_dropoff() {
        let rule = SettlementRule::new("S1", 50).unwrap();
        let ride_id = Uuid::new_v4();
        let body = format!(r#"{{"RideID":"{ride_id}","Location":"B","UserID":"U1"}}"#);
        let inbound = Envelope::new(topics::dropoff_complete().unwrap(), body.into_bytes());

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].topic(), "PaymentRequest/U1");

        let payment: PaymentRequest = outbound[0].decode().unwrap();
        assert_eq!(payment.ride_id, ride_id);
        assert_eq!(payment.user_id, "U1");
        assert_eq!(payment.cost, 50);
    }

    #[test]
    fn test_dropoff_without_rider_does_not_decode() {
        let inbound = Envelope::new(
            topics::dropoff_complete().unwrap(),
            br#"{"RideID":"not-a-uuid","Location":"B"}"#.to_vec(),
        );
        assert!(inbound.decode::<DropoffComplete>().is_err());
    }
}
