//! # Taxi Call
//!
//! A ride-hailing workflow built from five participants that never call each
//! other: every interaction is a topic-addressed message through a broker.
//!
//! - [`requester_actor`] - the rider, asking for a ride and waiting for the bill
//! - [`dispatcher_actor`] - assigns a taxi and dispatches the driver
//! - [`carrier_actor`] - the driver, reporting pickup, dropoff and availability
//! - [`settlement_actor`] - turns finished rides into payment requests
//! - [`ledger_actor`] - acknowledges payment requests to the payer
//!
//! Each role is a [`CorrelationRule`](participant_framework::CorrelationRule)
//! run by the generic [`ParticipantActor`](participant_framework::ParticipantActor).
//! [`topics`] holds the addressing scheme, [`model`] the wire payloads and
//! [`lifecycle`] the orchestration used by the demo binary and the tests.

pub mod carrier_actor;
pub mod cli;
pub mod config;
pub mod dispatcher_actor;
pub mod error;
pub mod ledger_actor;
pub mod lifecycle;
pub mod model;
pub mod requester_actor;
pub mod settlement_actor;
pub mod topics;
