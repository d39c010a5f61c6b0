use investor_types::{IntentStatus, PortalError};
use thiserror::Error;

use crate::machine::IntentEvent;

/// An event that is not valid from the current status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("intent already exists with status {0}")]
    AlreadyExists(IntentStatus),

    #[error("invalid intent transition: {from} -> {event:?}")]
    Invalid { from: IntentStatus, event: IntentEvent },
}

impl From<TransitionError> for PortalError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyExists(status) => PortalError::IntentAlreadyExists { status },
            TransitionError::Invalid { from, event } => PortalError::InvalidTransition {
                operation: event.operation(),
                status: from,
            },
        }
    }
}
