//! # Observability & Tracing
//!
//! [`setup_tracing`] installs a compact `fmt` subscriber filtered by
//! `RUST_LOG`. Participants log with structured `role` and `id` fields instead
//! of module paths, so the target is hidden.
//!
//! ```bash
//! # lifecycle transitions, sends and session events
//! RUST_LOG=info cargo run -- tcp://localhost:55555 rider@default secret
//!
//! # also decoded inbound payloads and ignored deliveries
//! RUST_LOG=debug cargo run -- tcp://localhost:55555 rider@default secret
//! ```
//!
//! With `RUST_LOG=info` a ride reads roughly like:
//!
//! ```text
//! INFO Connecting role="requester" id="U1" endpoint=tcp://localhost:55555 ...
//! INFO Subscribed role="requester" id="U1" topic=RideRequestResponse/U1/*
//! INFO Sent role="requester" id="U1" topic="taxi/requests"
//! INFO Sent role="dispatcher" id="OP1" topic="RideRequestResponse/U1"
//! INFO Workflow complete role="requester" id="U1"
//! ```

/// Initializes the global subscriber. Call once, from `main`.
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .compact()
        .init();
}
