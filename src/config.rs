//! # Ride Configuration
//!
//! Settings for the demo ride, loaded in layers (later overrides earlier):
//!
//! 1. built-in defaults;
//! 2. `taxi.yaml` in the current directory, if present;
//! 3. the file given by `path`, if any;
//! 4. the file named by `TAXI_CONFIG`, if set;
//! 5. `TAXI__<FIELD>` environment variables, e.g. `TAXI__FARE=65`.
//!
//! Command-line arguments are applied on top by the binary.

use participant_framework::{Credentials, ParticipantSettings, DEFAULT_RECONNECT_RETRIES};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "taxi.yaml";
/// Environment variable naming a configuration file.
pub const CONFIG_ENV_VAR: &str = "TAXI_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "TAXI";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RideConfig {
    pub endpoint: String,
    pub namespace: String,
    /// Login of the rider's sessions. The other roles log in as their role tag.
    pub username: String,
    pub password: String,
    pub user_id: String,
    pub operator_id: String,
    pub driver_id: String,
    pub settlement_id: String,
    pub ledger_id: String,
    pub fare: u32,
    pub taxi_number: String,
    pub eta: String,
    pub pickup_location: String,
    pub destination: String,
    pub reconnect_retries: u32,
    /// Seconds a participant waits for its terminal event. Unset waits forever.
    pub wait_timeout_secs: Option<u64>,
}

impl Default for RideConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://localhost:55555".into(),
            namespace: "default".into(),
            username: "rider".into(),
            password: String::new(),
            user_id: "User123".into(),
            operator_id: "Operator123".into(),
            driver_id: "Driver123".into(),
            settlement_id: "Payment".into(),
            ledger_id: "CompanyQ".into(),
            fare: 50,
            taxi_number: "1234".into(),
            eta: "5 minutes".into(),
            pickup_location: "LocationA".into(),
            destination: "LocationB".into(),
            reconnect_retries: DEFAULT_RECONNECT_RETRIES,
            wait_timeout_secs: None,
        }
    }
}

impl RideConfig {
    /// Loads configuration from files and environment.
    pub fn load(path: Option<&str>) -> Result<Self, ::config::ConfigError> {
        use ::config::{Config, Environment, File, FileFormat};

        let mut builder = Config::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Credentials for a participant logging in as `username`.
    pub fn credentials(&self, username: &str) -> Credentials {
        Credentials::new(
            self.endpoint.as_str(),
            self.namespace.as_str(),
            username,
            self.password.as_str(),
        )
    }

    pub fn settings(&self) -> ParticipantSettings {
        ParticipantSettings {
            reconnect_retries: self.reconnect_retries,
            no_local: false,
            wait_timeout: self.wait_timeout_secs.map(Duration::from_secs),
        }
    }
}
