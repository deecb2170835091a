use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Sent by the dispatcher to the assigned driver on `PickupRequest/<driver>/<ride>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PickupRequest {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "RideID")]
    pub ride_id: Uuid,
    #[serde(rename = "UserID")]
    pub user_id: String,
    #[serde(rename = "DriverID")]
    pub driver_id: String,
    pub location: String,
    pub destination: String,
}

/// The driver's direct answer to a pickup request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PickupResponse {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "RideID")]
    pub ride_id: Uuid,
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PickupComplete {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "RideID")]
    pub ride_id: Uuid,
    pub location: String,
}

/// Published on `DropoffComplete`; carries the rider so settlement knows who pays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DropoffComplete {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "RideID")]
    pub ride_id: Uuid,
    pub location: String,
    #[serde(rename = "UserID")]
    pub user_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DriverStatus {
    Available,
}

impl DriverStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DriverStatus::Available => "AVAILABLE",
        }
    }
}

impl fmt::Display for DriverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LocationUpdate {
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "DriverID")]
    pub driver_id: String,
    pub location: String,
    pub status: DriverStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pickup_request_wire_names() {
        let ride_id = Uuid::new_v4();
        let raw = format!(
            r#"{{"RideID":"{ride_id}","UserID":"U1","DriverID":"D1","Location":"A","Destination":"B","Fare":12}}"#
        );
        let request: PickupRequest = serde_json::from_str(&raw).unwrap();
        assert_eq!(request.ride_id, ride_id);
        assert_eq!(request.driver_id, "D1");
        assert_eq!(request.destination, "B");
    }

    #[test]
    fn test_status_renders_upper_case() {
        let update = LocationUpdate {
            timestamp: Utc::now(),
            driver_id: "D1".into(),
            location: "B".into(),
            status: DriverStatus::Available,
        };
        let json = serde_json::to_value(&update).unwrap();
        assert_eq!(json["Status"], "AVAILABLE");
        assert_eq!(json["DriverID"], "D1");
        assert_eq!(DriverStatus::Available.to_string(), "AVAILABLE");
    }
}
