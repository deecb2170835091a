use participant_framework::{ParticipantError, Release, TopicError};

/// Errors raised by the ride correlation rules.
///
/// Surfaced by the participant actor as processing errors: the offending
/// message is skipped and the participant keeps waiting.
#[derive(Debug, thiserror::Error)]
pub enum RideError {
    #[error("Cannot address reply: {0}")]
    Topic(#[from] TopicError),
    #[error("Cannot encode payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("Expected a {expected}, got a {received}")]
    UnexpectedMessage {
        expected: &'static str,
        received: &'static str,
    },
}

/// Errors raised while orchestrating a ride.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    #[error("Invalid identifier in configuration: {0}")]
    Topic(#[from] TopicError),
    #[error("{role} failed: {source}")]
    Participant {
        role: &'static str,
        source: ParticipantError,
    },
    #[error("{role} stopped without a reply ({release:?})")]
    NoReply { role: &'static str, release: Release },
    #[error("{0} task did not complete")]
    Join(&'static str),
    #[error("Unexpected reply payload: {0}")]
    Payload(#[from] serde_json::Error),
}
