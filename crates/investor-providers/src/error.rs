//! Backend error types.

use investor_types::{
    DisclaimerVersion, ErrorKind, IntentStatus, PortalError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while talking to the backend collaborator.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Transport failure (connect, timeout, TLS).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A base URL or path could not be joined.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Response body did not decode.
    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The backend rejected the request with a typed reason.
    #[error("backend rejected request ({}): {}", .0.kind_label(), .0.message)]
    Rejected(ApiErrorBody),

    /// Non-success status without a typed reason.
    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Test hook: a failure injected into the in-memory backend.
    #[error("injected failure for {0}")]
    Injected(String),
}

/// Error body returned by the backend on a rejected request.
///
/// Only `kind` and `message` are always present; the other fields carry
/// the details a particular kind needs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub kind: Option<ErrorKind>,
    #[serde(default)]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<IntentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_version: Option<DisclaimerVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_version: Option<DisclaimerVersion>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl ApiErrorBody {
    fn kind_label(&self) -> String {
        self.kind
            .map(|k| format!("{:?}", k))
            .unwrap_or_else(|| "unclassified".into())
    }

    /// Rebuild the typed error a backend rejection stands for.
    ///
    /// Kinds the backend has no business reporting degrade to a network
    /// failure carrying the message.
    pub fn into_portal_error(self) -> PortalError {
        let Some(kind) = self.kind else {
            return PortalError::NetworkFailure(self.message);
        };

        match kind {
            ErrorKind::BelowMinimum => PortalError::BelowMinimum {
                amount: self.amount.unwrap_or_default(),
                minimum: self.minimum.unwrap_or_default(),
            },
            ErrorKind::RiskNotAcknowledged => PortalError::RiskNotAcknowledged,
            ErrorKind::IntentAlreadyExists => PortalError::IntentAlreadyExists {
                status: self.status.unwrap_or_default(),
            },
            ErrorKind::RequiredAcknowledgmentMissing => {
                PortalError::RequiredAcknowledgmentMissing {
                    missing: self.missing,
                }
            }
            ErrorKind::StaleDisclaimerVersion => PortalError::StaleDisclaimerVersion {
                submitted: self
                    .submitted_version
                    .unwrap_or_else(|| DisclaimerVersion::new("")),
                current: self.current_version,
            },
            ErrorKind::VerificationNotConfirmed => {
                PortalError::VerificationNotConfirmed(self.message)
            }
            ErrorKind::EmptyLegalName => PortalError::EmptyLegalName,
            ErrorKind::InvalidTransition => PortalError::InvalidTransition {
                operation: "backend operation",
                status: self.status.unwrap_or_default(),
            },
            ErrorKind::OverrideNotPermitted => PortalError::OverrideNotPermitted(self.message),
            ErrorKind::ResolverFailure
            | ErrorKind::NetworkFailure
            | ErrorKind::UnknownDocument
            | ErrorKind::OperationInFlight => PortalError::NetworkFailure(self.message),
        }
    }

    /// Body describing `err`, as the in-memory backend would send it.
    pub fn from_portal_error(err: &PortalError) -> Self {
        let mut body = ApiErrorBody {
            kind: Some(err.kind()),
            message: err.to_string(),
            ..Default::default()
        };
        match err {
            PortalError::BelowMinimum { amount, minimum } => {
                body.amount = Some(*amount);
                body.minimum = Some(*minimum);
            }
            PortalError::IntentAlreadyExists { status }
            | PortalError::InvalidTransition { status, .. } => body.status = Some(*status),
            PortalError::RequiredAcknowledgmentMissing { missing } => {
                body.missing = missing.clone();
            }
            PortalError::StaleDisclaimerVersion { submitted, current } => {
                body.submitted_version = Some(submitted.clone());
                body.current_version = current.clone();
            }
            _ => {}
        }
        body
    }
}

impl From<BackendError> for PortalError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(body) => body.into_portal_error(),
            other => PortalError::NetworkFailure(other.to_string()),
        }
    }
}

/// Result type for backend transport operations.
pub type BackendResult<T> = Result<T, BackendError>;
