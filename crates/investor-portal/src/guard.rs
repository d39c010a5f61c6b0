//! Per-operation in-flight guards.
//!
//! A second invocation of an operation while the first is still awaiting
//! its backend call is rejected immediately, not queued. The guard is
//! released on drop, so a failed call leaves the operation available.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use investor_types::{PortalError, PortalResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Every guarded portal operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalOperation {
    Mount,
    OpenDocument,
    StartVerification,
    ConfirmVerification,
    OperatorOverride,
    AcceptDisclaimer,
    SubmitIntent,
    SignConsent,
    ResendSigningLink,
    RefreshIntent,
}

impl PortalOperation {
    pub const ALL: [PortalOperation; 10] = [
        PortalOperation::Mount,
        PortalOperation::OpenDocument,
        PortalOperation::StartVerification,
        PortalOperation::ConfirmVerification,
        PortalOperation::OperatorOverride,
        PortalOperation::AcceptDisclaimer,
        PortalOperation::SubmitIntent,
        PortalOperation::SignConsent,
        PortalOperation::ResendSigningLink,
        PortalOperation::RefreshIntent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            PortalOperation::Mount => "loading the portal",
            PortalOperation::OpenDocument => "opening a document",
            PortalOperation::StartVerification => "starting identity verification",
            PortalOperation::ConfirmVerification => "confirming identity verification",
            PortalOperation::OperatorOverride => "operator verification override",
            PortalOperation::AcceptDisclaimer => "accepting the disclaimer",
            PortalOperation::SubmitIntent => "submitting the investment",
            PortalOperation::SignConsent => "signing the consent",
            PortalOperation::ResendSigningLink => "resending the signing link",
            PortalOperation::RefreshIntent => "refreshing the investment status",
        }
    }
}

impl fmt::Display for PortalOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// In-flight flags for every operation.
#[derive(Debug)]
pub struct InFlight {
    flags: HashMap<PortalOperation, Arc<AtomicBool>>,
}

impl Default for InFlight {
    fn default() -> Self {
        Self::new()
    }
}

impl InFlight {
    pub fn new() -> Self {
        Self {
            flags: PortalOperation::ALL
                .iter()
                .map(|op| (*op, Arc::new(AtomicBool::new(false))))
                .collect(),
        }
    }

    /// Claim `operation`, or fail with `OperationInFlight` if it is busy.
    pub fn acquire(&self, operation: PortalOperation) -> PortalResult<OperationGuard> {
        let flag = self
            .flags
            .get(&operation)
            .cloned()
            .unwrap_or_else(|| Arc::new(AtomicBool::new(false)));

        if flag
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(operation = ?operation, "Ignoring re-entrant call");
            return Err(PortalError::OperationInFlight(operation.to_string()));
        }

        Ok(OperationGuard { operation, flag })
    }

    pub fn is_busy(&self, operation: PortalOperation) -> bool {
        self.flags
            .get(&operation)
            .map(|flag| flag.load(Ordering::Acquire))
            .unwrap_or(false)
    }
}

/// Held for the duration of one operation.
#[derive(Debug)]
pub struct OperationGuard {
    operation: PortalOperation,
    flag: Arc<AtomicBool>,
}

impl OperationGuard {
    pub fn operation(&self) -> PortalOperation {
        self.operation
    }
}

impl Drop for OperationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use investor_types::ErrorKind;

    #[test]
    fn test_second_acquire_rejected_while_held() {
        let in_flight = InFlight::new();
        let guard = in_flight.acquire(PortalOperation::SubmitIntent).unwrap();
        assert!(in_flight.is_busy(PortalOperation::SubmitIntent));

        let err = in_flight.acquire(PortalOperation::SubmitIntent).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::OperationInFlight);
        assert!(err.to_string().contains("submitting the investment"));

        drop(guard);
        assert!(!in_flight.is_busy(PortalOperation::SubmitIntent));
        assert!(in_flight.acquire(PortalOperation::SubmitIntent).is_ok());
    }

    #[test]
    fn test_operations_are_independent() {
        let in_flight = InFlight::new();
        let _submit = in_flight.acquire(PortalOperation::SubmitIntent).unwrap();
        assert!(in_flight.acquire(PortalOperation::RefreshIntent).is_ok());
    }
}
