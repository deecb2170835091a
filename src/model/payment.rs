use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Asks a payer to settle a finished ride. Published on `PaymentRequest/<payer>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PaymentRequest {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "RideID")]
    pub ride_id: Uuid,
    #[serde(rename = "UserID")]
    pub user_id: String,
    pub cost: u32,
}

impl PaymentRequest {
    pub fn new(ride_id: Uuid, user_id: impl Into<String>, cost: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            ride_id,
            user_id: user_id.into(),
            cost,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_wire_names() {
        let ride_id = Uuid::new_v4();
        let json = serde_json::to_value(PaymentRequest::new(ride_id, "U1", 50)).unwrap();
        assert_eq!(json["Cost"], 50);
        assert_eq!(json["UserID"], "U1");
        assert_eq!(json["RideID"], ride_id.to_string());
    }
}
