use crate::error::RideError;
use crate::model::{PaymentRequest, Role};
use crate::topics;
use participant_framework::{CorrelationRule, Envelope, Identity, Outbound, TopicAddress, TopicError};
use tracing::info;

/// Acknowledges payment requests by forwarding them to the payer.
#[derive(Debug)]
pub struct LedgerRule {
    identity: Identity,
}

impl LedgerRule {
    pub fn new(ledger_id: &str) -> Result<Self, TopicError> {
        Ok(Self {
            identity: Identity::new(Role::Ledger.as_str(), ledger_id)?,
        })
    }
}

impl CorrelationRule for LedgerRule {
    type Inbound = PaymentRequest;
    type Error = RideError;

    fn identity(&self) -> &Identity {
        &self.identity
    }

    fn subscription(&self) -> Result<TopicAddress, TopicError> {
        topics::subscription_pattern(Role::Ledger, self.identity.id())
    }

    /// The payload travels on untouched, including fields this side does not know.
    fn correlate(&self, payment: PaymentRequest, inbound: &Envelope) -> Result<Outbound<RideError>, RideError> {
        let destination = topics::payment_request(&payment.user_id)?;
        info!(user_id = %payment.user_id, ride_id = %payment.ride_id, cost = payment.cost, "Recording payment");
        Ok(vec![Envelope::new(destination, inbound.payload.clone())].into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_forwards_payload_verbatim() {
        let rule = LedgerRule::new("L1").unwrap();
        let body = format!(
            r#"{{"RideID":"{}","UserID":"U1","Cost":50,"Currency":"KRW"}}"#,
            Uuid::new_v4()
        );
        let inbound = Envelope::new(topics::payment_request("U1").unwrap(), body.clone().into_bytes());

        let outbound = rule.correlate(inbound.decode().unwrap(), &inbound).unwrap();
        assert_eq!(outbound.len(), 1);
        assert_eq!(outbound[0].topic(), "PaymentRequest/U1");
        assert_eq!(outbound[0].payload, body.into_bytes());
    }

    #[test]
    fn test_subscribes_to_every_payer() {
        let rule = LedgerRule::new("L1").unwrap();
        let pattern = rule.subscription().unwrap();
        assert!(pattern.matches_str("PaymentRequest/U1"));
        assert!(pattern.matches_str("PaymentRequest/U2"));
        assert!(!pattern.matches_str("DropoffComplete"));
    }
}
