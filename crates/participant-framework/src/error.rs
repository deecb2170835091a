//! # Participant Errors
//!
//! One taxonomy for every participant, whatever its role:
//!
//! | Kind | Raised when | Effect |
//! |------|-------------|--------|
//! | `Configuration` | a required credential or identifier is blank or invalid | actor never starts |
//! | `Connection` | the connect call fails | actor terminates |
//! | `Subscription` | the subscribe call fails | actor terminates |
//! | `Send` | a single publish fails | reported, remaining sends continue |
//! | `Processing` | an inbound payload cannot be interpreted | reported, actor keeps waiting |
//!
//! Non-fatal errors end up in the actor's journal as [`ReportedError`]s.

use crate::broker::BrokerStatus;
use crate::lifecycle::InvalidTransition;
use crate::topic::TopicError;

/// Errors that can occur while running a participant.
#[derive(Debug, thiserror::Error)]
pub enum ParticipantError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Connection error: {0}")]
    Connection(BrokerStatus),
    #[error("Subscription to {topic} failed: {status}")]
    Subscription { topic: String, status: BrokerStatus },
    #[error("Send to {topic} failed: {status}")]
    Send { topic: String, status: BrokerStatus },
    #[error("Processing error: {0}")]
    Processing(Box<dyn std::error::Error + Send + Sync>),
    #[error("Topic error: {0}")]
    Topic(#[from] TopicError),
    #[error(transparent)]
    Lifecycle(#[from] InvalidTransition),
}

/// Copyable classification of a [`ParticipantError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    Connection,
    Subscription,
    Send,
    Processing,
}

impl ParticipantError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ParticipantError::Configuration(_) | ParticipantError::Topic(_) => ErrorKind::Configuration,
            ParticipantError::Connection(_) | ParticipantError::Lifecycle(_) => ErrorKind::Connection,
            ParticipantError::Subscription { .. } => ErrorKind::Subscription,
            ParticipantError::Send { .. } => ErrorKind::Send,
            ParticipantError::Processing(_) => ErrorKind::Processing,
        }
    }

    /// Fatal errors end the actor; the others are reported and skipped.
    pub fn is_fatal(&self) -> bool {
        !matches!(self.kind(), ErrorKind::Send | ErrorKind::Processing)
    }
}

/// A journal entry for a non-fatal error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportedError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ParticipantError> for ReportedError {
    fn from(error: &ParticipantError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}
