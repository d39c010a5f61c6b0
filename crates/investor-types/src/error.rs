use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{DisclaimerVersion, DocumentId};
use crate::intent::IntentStatus;

/// Flat classification of every failure the core can report.
///
/// The presentation layer branches on this rather than on error text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    BelowMinimum,
    RiskNotAcknowledged,
    IntentAlreadyExists,
    RequiredAcknowledgmentMissing,
    StaleDisclaimerVersion,
    VerificationNotConfirmed,
    ResolverFailure,
    NetworkFailure,
    InvalidTransition,
    EmptyLegalName,
    UnknownDocument,
    OperationInFlight,
    OverrideNotPermitted,
}

impl ErrorKind {
    /// Detected before any network call; never retried automatically.
    pub fn is_validation(self) -> bool {
        !matches!(
            self,
            ErrorKind::VerificationNotConfirmed | ErrorKind::ResolverFailure | ErrorKind::NetworkFailure
        )
    }

    /// The user may retry by hand. Nothing in the core retries these in
    /// the background.
    pub fn is_retryable(self) -> bool {
        !self.is_validation()
    }
}

/// Errors surfaced by the investor access and investment workflow.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PortalError {
    #[error("amount {amount} is below the minimum investment of {minimum}")]
    BelowMinimum { amount: u64, minimum: u64 },

    #[error("the risk acknowledgment for this investment has not been checked")]
    RiskNotAcknowledged,

    #[error("an investment intent already exists with status {status}")]
    IntentAlreadyExists { status: IntentStatus },

    #[error("required acknowledgments not checked: {}", .missing.join(", "))]
    RequiredAcknowledgmentMissing { missing: Vec<String> },

    #[error("disclaimer version {submitted} is stale (current: {})", .current.as_ref().map(|v| v.to_string()).unwrap_or_else(|| "unavailable".into()))]
    StaleDisclaimerVersion {
        submitted: DisclaimerVersion,
        current: Option<DisclaimerVersion>,
    },

    #[error("identity verification was not confirmed: {0}")]
    VerificationNotConfirmed(String),

    #[error("could not resolve document {document}: {reason}")]
    ResolverFailure { document: DocumentId, reason: String },

    #[error("network failure: {0}")]
    NetworkFailure(String),

    #[error("{operation} is not valid while the intent is {status}")]
    InvalidTransition {
        operation: &'static str,
        status: IntentStatus,
    },

    #[error("typed legal name must not be empty")]
    EmptyLegalName,

    #[error("unknown document: {0}")]
    UnknownDocument(DocumentId),

    #[error("{0} is already in progress")]
    OperationInFlight(String),

    #[error("operator verification override not permitted: {0}")]
    OverrideNotPermitted(String),
}

impl PortalError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PortalError::BelowMinimum { .. } => ErrorKind::BelowMinimum,
            PortalError::RiskNotAcknowledged => ErrorKind::RiskNotAcknowledged,
            PortalError::IntentAlreadyExists { .. } => ErrorKind::IntentAlreadyExists,
            PortalError::RequiredAcknowledgmentMissing { .. } => {
                ErrorKind::RequiredAcknowledgmentMissing
            }
            PortalError::StaleDisclaimerVersion { .. } => ErrorKind::StaleDisclaimerVersion,
            PortalError::VerificationNotConfirmed(_) => ErrorKind::VerificationNotConfirmed,
            PortalError::ResolverFailure { .. } => ErrorKind::ResolverFailure,
            PortalError::NetworkFailure(_) => ErrorKind::NetworkFailure,
            PortalError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            PortalError::EmptyLegalName => ErrorKind::EmptyLegalName,
            PortalError::UnknownDocument(_) => ErrorKind::UnknownDocument,
            PortalError::OperationInFlight(_) => ErrorKind::OperationInFlight,
            PortalError::OverrideNotPermitted(_) => ErrorKind::OverrideNotPermitted,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind().is_validation()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Actionable message for the investor.
    pub fn user_message(&self) -> String {
        match self {
            PortalError::BelowMinimum { minimum, .. } => {
                format!("The minimum investment is {}.", minimum)
            }
            PortalError::RiskNotAcknowledged => {
                "Please confirm you understand the risks of this investment.".into()
            }
            PortalError::IntentAlreadyExists { .. } => {
                "You already have an investment in progress.".into()
            }
            PortalError::RequiredAcknowledgmentMissing { .. } => {
                "Please check every required acknowledgment.".into()
            }
            PortalError::StaleDisclaimerVersion { .. } => {
                "The risk disclosures have changed. Please review the latest version.".into()
            }
            PortalError::VerificationNotConfirmed(_) => {
                "We could not confirm your identity verification. Please try again.".into()
            }
            PortalError::ResolverFailure { .. } => {
                "This document could not be opened right now. Please try again.".into()
            }
            PortalError::NetworkFailure(_) => {
                "Something went wrong talking to the server. Please try again.".into()
            }
            PortalError::InvalidTransition { .. } => {
                "That step is not available for your investment right now.".into()
            }
            PortalError::EmptyLegalName => "Please type your full legal name to sign.".into(),
            PortalError::UnknownDocument(_) => "That document is no longer available.".into(),
            PortalError::OperationInFlight(_) => "Still working on your last request.".into(),
            PortalError::OverrideNotPermitted(reason) => reason.clone(),
        }
    }
}

pub type PortalResult<T> = Result<T, PortalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_kinds_are_not_retryable() {
        for kind in [
            ErrorKind::BelowMinimum,
            ErrorKind::RiskNotAcknowledged,
            ErrorKind::RequiredAcknowledgmentMissing,
            ErrorKind::IntentAlreadyExists,
            ErrorKind::StaleDisclaimerVersion,
        ] {
            assert!(kind.is_validation(), "{:?}", kind);
            assert!(!kind.is_retryable(), "{:?}", kind);
        }
    }

    #[test]
    fn transport_kinds_are_user_retryable() {
        for kind in [
            ErrorKind::VerificationNotConfirmed,
            ErrorKind::ResolverFailure,
            ErrorKind::NetworkFailure,
        ] {
            assert!(kind.is_retryable(), "{:?}", kind);
        }
    }

    #[test]
    fn stale_version_display_names_both_versions() {
        let err = PortalError::StaleDisclaimerVersion {
            submitted: DisclaimerVersion::new("v1"),
            current: Some(DisclaimerVersion::new("v2")),
        };
        let s = err.to_string();
        assert!(s.contains("v1"));
        assert!(s.contains("v2"));
        assert_eq!(err.kind(), ErrorKind::StaleDisclaimerVersion);
    }

    #[test]
    fn missing_acknowledgments_listed() {
        let err = PortalError::RequiredAcknowledgmentMissing {
            missing: vec!["loss".into(), "illiquid".into()],
        };
        assert!(err.to_string().contains("loss, illiquid"));
    }
}
