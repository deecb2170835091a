use chrono::{DateTime, Utc};
use participant_framework::topic::validate_identifier;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Published by a rider on `taxi/requests`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RideRequest {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "UserID")]
    pub user_id: String,
    pub current_location: String,
    pub destination: String,
}

impl RideRequest {
    pub fn new(
        user_id: impl Into<String>,
        current_location: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            current_location: current_location.into(),
            destination: destination.into(),
        }
    }

    /// A request can only be served with both ends of the trip known. The
    /// destination also has to be addressable, since the driver announces
    /// itself there once the ride is over.
    pub fn is_serviceable(&self) -> bool {
        !self.current_location.trim().is_empty() && validate_identifier(&self.destination).is_ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideResult {
    Success,
    Declined,
}

impl fmt::Display for RideResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RideResult::Success => f.write_str("SUCCESS"),
            RideResult::Declined => f.write_str("DECLINED"),
        }
    }
}

/// The dispatcher's answer, published on `RideRequestResponse/<user>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RideRequestResponse {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    pub result: RideResult,
    #[serde(rename = "RideID", default, skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<Uuid>,
    #[serde(rename = "ETA", default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taxi_number: Option<String>,
    #[serde(rename = "DriverID", default, skip_serializing_if = "Option::is_none")]
    pub driver_id: Option<String>,
}

impl RideRequestResponse {
    pub fn success(
        ride_id: Uuid,
        eta: impl Into<String>,
        taxi_number: impl Into<String>,
        driver_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            result: RideResult::Success,
            ride_id: Some(ride_id),
            eta: Some(eta.into()),
            taxi_number: Some(taxi_number.into()),
            driver_id: Some(driver_id.into()),
        }
    }

    pub fn declined() -> Self {
        Self {
            timestamp: Utc::now(),
            result: RideResult::Declined,
            ride_id: None,
            eta: None,
            taxi_number: None,
            driver_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ride_request_wire_names() {
        let request: RideRequest =
            serde_json::from_str(r#"{"UserID":"U1","CurrentLocation":"A","Destination":"B"}"#).unwrap();
        assert_eq!(request.user_id, "U1");
        assert!(request.is_serviceable());

        let json = serde_json::to_value(RideRequest::new("U1", " ", "B")).unwrap();
        assert_eq!(json["UserID"], "U1");
        assert!(json.get("Timestamp").is_some());
        assert!(!RideRequest::new("U1", " ", "B").is_serviceable());
        assert!(!RideRequest::new("U1", "A", "Main St/5th Ave").is_serviceable());
    }

    #[test]
    fn test_response_result_is_upper_case() {
        let ride_id = Uuid::new_v4();
        let json = serde_json::to_value(RideRequestResponse::success(ride_id, "5 minutes", "1234", "D1")).unwrap();
        assert_eq!(json["Result"], "SUCCESS");
        assert_eq!(json["RideID"], ride_id.to_string());
        assert_eq!(json["ETA"], "5 minutes");
        assert_eq!(json["TaxiNumber"], "1234");

        let json = serde_json::to_value(RideRequestResponse::declined()).unwrap();
        assert_eq!(json["Result"], "DECLINED");
        assert!(json.get("RideID").is_none());
    }
}
