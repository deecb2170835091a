//! # Taxi Call
//!
//! Runs one complete ride (request, dispatch, pickup, dropoff, billing) over
//! the in-process broker and logs every hop.
//!
//! ```bash
//! RUST_LOG=info cargo run -- tcp://localhost:55555 rider@default secret Driver123
//! ```
//!
//! Settings not given on the command line come from `taxi.yaml`, the file in
//! `TAXI_CONFIG` and `TAXI__*` variables; see [`taxi_call::config`].

use participant_framework::memory::InMemoryBroker;
use participant_framework::tracing::setup_tracing;
use taxi_call::cli::{parse_args, USAGE};
use taxi_call::config::RideConfig;
use taxi_call::lifecycle::RideSystem;
use tracing::{error, info, Instrument};

#[tokio::main]
async fn main() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            std::process::exit(1);
        }
    };

    setup_tracing();

    let mut config = RideConfig::load(None).map_err(|e| e.to_string())?;
    cli.apply(&mut config);
    info!(
        endpoint = %config.endpoint,
        namespace = %config.namespace,
        user_id = %config.user_id,
        driver_id = %config.driver_id,
        "Starting ride network"
    );

    let mut system = RideSystem::start(InMemoryBroker::new(), config)
        .await
        .map_err(|e| e.to_string())?;

    let ride = system
        .request_ride()
        .instrument(tracing::info_span!("demo"))
        .await;
    system.shutdown().await;

    match ride {
        Ok(summary) => {
            info!(
                result = %summary.response.result,
                ride_id = ?summary.response.ride_id,
                taxi_number = ?summary.response.taxi_number,
                cost = ?summary.payment.as_ref().map(|payment| payment.cost),
                "Ride complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Ride failed");
            Err(e.to_string())
        }
    }
}
