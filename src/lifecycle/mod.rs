//! # Ride Orchestration
//!
//! Individual participants are simple; starting them in the right order is
//! where the coordination lives. [`RideSystem`] plays the conductor for one
//! in-process ride network:
//!
//! 1. **Start** - dispatcher, settlement and ledger are spawned and each is
//!    awaited until it is subscribed and waiting.
//! 2. **Ride** - a driver and a billing listener are brought up before the
//!    rider publishes its request, so no message is sent into the void.
//! 3. **Shutdown** - every session is disconnected; participants that only
//!    stop on a session event are released that way and then awaited.
//!
//! ```rust,no_run
//! use participant_framework::memory::InMemoryBroker;
//! use taxi_call::config::RideConfig;
//! use taxi_call::lifecycle::RideSystem;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut system = RideSystem::start(InMemoryBroker::new(), RideConfig::default()).await?;
//!     let summary = system.request_ride().await?;
//!     println!("{:?}", summary.payment);
//!     system.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod ride_system;

pub use ride_system::*;
