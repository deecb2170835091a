//! # Envelopes
//!
//! An [`Envelope`] pairs an opaque payload with the topic it is addressed to.
//! Envelopes are built by an actor right before a send, read by the receiving
//! actor's handler and then dropped; nothing is persisted.
//!
//! Correlation travels with the envelope itself:
//!
//! - `reply_to` names the topic a responder should answer on.
//! - `in_reply_to` is set on replies and points back at the topic of the
//!   envelope being answered.

use crate::topic::TopicAddress;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A message paired with its destination and optional correlation data.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub destination: TopicAddress,
    pub payload: Vec<u8>,
    pub reply_to: Option<TopicAddress>,
    pub in_reply_to: Option<TopicAddress>,
}

impl Envelope {
    pub fn new(destination: TopicAddress, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            destination,
            payload: payload.into(),
            reply_to: None,
            in_reply_to: None,
        }
    }

    /// Serializes `body` as JSON into a new envelope.
    pub fn json<T: Serialize>(destination: TopicAddress, body: &T) -> Result<Self, serde_json::Error> {
        Ok(Self::new(destination, serde_json::to_vec(body)?))
    }

    pub fn with_reply_to(mut self, reply_to: TopicAddress) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Builds the answer to `inbound`, addressed to its `reply_to` topic or to
    /// `fallback` when the sender did not ask for a reply.
    pub fn reply(inbound: &Envelope, fallback: TopicAddress, payload: impl Into<Vec<u8>>) -> Self {
        let destination = inbound.reply_to.clone().unwrap_or(fallback);
        Self {
            destination,
            payload: payload.into(),
            reply_to: None,
            in_reply_to: Some(inbound.destination.clone()),
        }
    }

    /// Decodes the payload as JSON. Unknown fields are ignored by the target
    /// type unless it opts out.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.payload)
    }

    pub fn topic(&self) -> String {
        self.destination.render()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Ping {
        #[serde(rename = "UserID")]
        user_id: String,
    }

    #[test]
    fn test_reply_uses_reply_to_when_present() {
        let request = Envelope::new(TopicAddress::parse("PickupRequest/D1/R1").unwrap(), b"{}".to_vec())
            .with_reply_to(TopicAddress::parse("PickupRequestResponse/R1").unwrap());

        let reply = Envelope::reply(&request, TopicAddress::parse("fallback").unwrap(), b"ok".to_vec());
        assert_eq!(reply.topic(), "PickupRequestResponse/R1");
        assert_eq!(reply.in_reply_to, Some(request.destination.clone()));

        let bare = Envelope::new(TopicAddress::parse("PickupRequest/D1/R1").unwrap(), b"{}".to_vec());
        let reply = Envelope::reply(&bare, TopicAddress::parse("fallback").unwrap(), b"ok".to_vec());
        assert_eq!(reply.topic(), "fallback");
    }

    #[test]
    fn test_decode_tolerates_unknown_fields() {
        let envelope = Envelope::new(
            TopicAddress::parse("t").unwrap(),
            br#"{"UserID":"U1","Extra":42}"#.to_vec(),
        );
        let ping: Ping = envelope.decode().unwrap();
        assert_eq!(ping, Ping { user_id: "U1".into() });

        let json = Envelope::json(TopicAddress::parse("t").unwrap(), &ping).unwrap();
        assert_eq!(json.decode::<Ping>().unwrap(), ping);
    }
}
