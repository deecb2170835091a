use crate::carrier_actor;
use crate::config::RideConfig;
use crate::dispatcher_actor::{self, Fleet};
use crate::error::SystemError;
use crate::ledger_actor;
use crate::model::{PaymentRequest, RideRequestResponse, RideResult, Role};
use crate::requester_actor;
use crate::settlement_actor;
use participant_framework::memory::InMemoryBroker;
use participant_framework::{
    CorrelationRule, ParticipantActor, ParticipantError, ParticipantHandle, Release, RunOutcome,
    SessionState,
};
use tokio::task::JoinHandle;
use tracing::{info, warn, Instrument};

type RunResult = Result<RunOutcome, ParticipantError>;

/// A spawned participant.
struct Running {
    role: Role,
    handle: ParticipantHandle,
    task: JoinHandle<RunResult>,
}

/// What a completed ride produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RideSummary {
    pub response: RideRequestResponse,
    /// `None` when the ride was declined and nothing was billed.
    pub payment: Option<PaymentRequest>,
}

/// Runs the service side of the ride network over an in-memory broker.
///
/// Dispatcher, settlement and ledger live for the whole system. Each call to
/// [`RideSystem::request_ride`] adds a driver and a rider.
pub struct RideSystem {
    broker: InMemoryBroker,
    config: RideConfig,
    participants: Vec<Running>,
}

impl RideSystem {
    /// Starts the long-running participants and waits until each is listening.
    pub async fn start(broker: InMemoryBroker, config: RideConfig) -> Result<Self, SystemError> {
        let mut system = Self {
            broker,
            config,
            participants: Vec::new(),
        };
        if let Err(e) = system.start_services().await {
            system.shutdown().await;
            return Err(e);
        }
        Ok(system)
    }

    async fn start_services(&mut self) -> Result<(), SystemError> {
        let config = &self.config;
        let fleet = Fleet {
            driver_id: config.driver_id.clone(),
            taxi_number: config.taxi_number.clone(),
            eta: config.eta.clone(),
        };
        let dispatcher = dispatcher_actor::new(
            &config.operator_id,
            fleet,
            true,
            config.credentials(Role::Dispatcher.as_str()),
            config.settings(),
        )?;
        let settlement = settlement_actor::new(
            &config.settlement_id,
            config.fare,
            config.credentials(Role::Settlement.as_str()),
            config.settings(),
        )?;
        let ledger = ledger_actor::new(
            &config.ledger_id,
            config.credentials(Role::Ledger.as_str()),
            config.settings(),
        )?;

        let running = self.launch(Role::Dispatcher, dispatcher).await?;
        self.participants.push(running);
        let running = self.launch(Role::Settlement, settlement).await?;
        self.participants.push(running);
        let running = self.launch(Role::Ledger, ledger).await?;
        self.participants.push(running);

        info!(participants = self.participants.len(), "Ride services ready");
        Ok(())
    }

    /// Spawns a participant and waits until it is listening.
    async fn launch<R: CorrelationRule>(
        &self,
        role: Role,
        (actor, handle): (ParticipantActor<R>, ParticipantHandle),
    ) -> Result<Running, SystemError> {
        let mut task = tokio::spawn(actor.run(self.broker.clone()));
        // a participant rejected before connecting never leaves Idle
        let state = tokio::select! {
            state = handle.wait_for_state(SessionState::AwaitingTerminalEvent) => state,
            joined = &mut task => return Err(finished_early(role, joined)),
        };
        match state {
            SessionState::AwaitingTerminalEvent => Ok(Running { role, handle, task }),
            _ => Err(finished_early(role, task.await)),
        }
    }

    /// Runs one ride end to end: driver and billing listener first, then the
    /// rider's request.
    pub async fn request_ride(&mut self) -> Result<RideSummary, SystemError> {
        let span = tracing::info_span!("ride", user_id = %self.config.user_id);
        self.ride().instrument(span).await
    }

    async fn ride(&mut self) -> Result<RideSummary, SystemError> {
        let config = self.config.clone();
        let carrier = carrier_actor::new(
            &config.driver_id,
            config.credentials(Role::Carrier.as_str()),
            config.settings(),
        )?;
        let carrier = self.launch(Role::Carrier, carrier).await?;

        let billing = requester_actor::billing(
            &config.user_id,
            config.credentials(&config.username),
            config.settings(),
        )?;
        let billing = match self.launch(Role::Requester, billing).await {
            Ok(billing) => billing,
            Err(e) => {
                self.participants.push(carrier);
                return Err(e);
            }
        };

        let (rider, rider_handle) = requester_actor::new(
            &config.user_id,
            &config.pickup_location,
            &config.destination,
            config.credentials(&config.username),
            config.settings(),
        )?;
        let rider_outcome = tokio::spawn(rider.run(self.broker.clone())).await;
        let response = match decode_reply::<RideRequestResponse>(Role::Requester, &rider_handle, rider_outcome) {
            Ok(response) => response,
            Err(e) => {
                self.participants.extend([carrier, billing]);
                return Err(e);
            }
        };
        info!(result = %response.result, ride_id = ?response.ride_id, "Ride answered");

        if response.result != RideResult::Success {
            // nobody will bill a declined ride; shutdown collects the leftovers
            self.participants.extend([carrier, billing]);
            return Ok(RideSummary {
                response,
                payment: None,
            });
        }

        let payment = match decode_reply::<PaymentRequest>(Role::Requester, &billing.handle, billing.task.await) {
            Ok(payment) => payment,
            Err(e) => {
                self.participants.push(carrier);
                return Err(e);
            }
        };
        if let Err(e) = expect_replied(Role::Carrier, carrier.task.await) {
            warn!(error = %e, "Carrier did not finish cleanly");
        }
        info!(cost = payment.cost, "Ride billed");

        Ok(RideSummary {
            response,
            payment: Some(payment),
        })
    }

    pub fn handle(&self, role: Role) -> Option<&ParticipantHandle> {
        self.participants
            .iter()
            .find(|running| running.role == role)
            .map(|running| &running.handle)
    }

    /// Ends every session and waits for all participants to finish.
    pub async fn shutdown(self) {
        info!(participants = self.participants.len(), "Shutting down ride system");
        self.broker.disconnect_all();
        for running in self.participants {
            match running.task.await {
                Ok(Ok(outcome)) => info!(role = %running.role, release = ?outcome.release, "Stopped"),
                Ok(Err(e)) => warn!(role = %running.role, error = %e, "Stopped with error"),
                Err(e) => warn!(role = %running.role, error = %e, "Task did not complete"),
            }
        }
    }
}

fn finished_early(role: Role, joined: Result<RunResult, tokio::task::JoinError>) -> SystemError {
    match joined {
        Ok(Err(source)) => SystemError::Participant {
            role: role.as_str(),
            source,
        },
        Ok(Ok(outcome)) => SystemError::NoReply {
            role: role.as_str(),
            release: outcome.release,
        },
        Err(_) => SystemError::Join(role.as_str()),
    }
}

fn expect_replied(
    role: Role,
    joined: Result<RunResult, tokio::task::JoinError>,
) -> Result<(), SystemError> {
    let outcome = joined
        .map_err(|_| SystemError::Join(role.as_str()))?
        .map_err(|source| SystemError::Participant {
            role: role.as_str(),
            source,
        })?;
    match outcome.release {
        Release::Replied => Ok(()),
        release => Err(SystemError::NoReply {
            role: role.as_str(),
            release,
        }),
    }
}

/// Decodes the message that released a participant.
fn decode_reply<T: serde::de::DeserializeOwned>(
    role: Role,
    handle: &ParticipantHandle,
    joined: Result<RunResult, tokio::task::JoinError>,
) -> Result<T, SystemError> {
    expect_replied(role, joined)?;
    let envelope = handle.last_inbound().ok_or(SystemError::NoReply {
        role: role.as_str(),
        release: Release::Replied,
    })?;
    Ok(envelope.decode()?)
}
