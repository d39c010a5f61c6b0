//! Backend collaborator traits.
//!
//! The access and intent crates each define the slice of the backend they
//! call. This module adds the remaining reads and the verification calls,
//! and composes everything into [`PortalBackend`].

use async_trait::async_trait;
use investor_access::{DisclaimerAcceptor, DocumentResolver};
use investor_intent::IntentBackend;
use investor_types::{
    DisclaimerDefinition, Document, Gates, Investor, PortalResult, RaiseConfig,
};
use serde::{Deserialize, Serialize};
use url::Url;

/// Where to send the browser to start an identity check.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectTarget {
    /// Full-page redirect destination. Carries provider tokens; never log it.
    pub url: Url,
}

/// Result of asking the backend whether the identity check completed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub verified: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl VerificationOutcome {
    pub fn verified() -> Self {
        Self {
            verified: true,
            reason: None,
        }
    }

    pub fn not_verified(reason: impl Into<String>) -> Self {
        Self {
            verified: false,
            reason: Some(reason.into()),
        }
    }
}

/// An operator's explicit sign-off for bypassing identity verification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorConfirmation {
    pub operator: String,
    pub acknowledgement: String,
}

impl OperatorConfirmation {
    /// Phrase the operator must type verbatim.
    pub const ACKNOWLEDGEMENT: &'static str = "I CONFIRM THIS BYPASSES IDENTITY VERIFICATION";

    pub fn new(operator: impl Into<String>, acknowledgement: impl Into<String>) -> Self {
        Self {
            operator: operator.into(),
            acknowledgement: acknowledgement.into(),
        }
    }

    /// Non-empty operator and exact acknowledgement phrase.
    pub fn is_valid(&self) -> bool {
        !self.operator.trim().is_empty() && self.acknowledgement.trim() == Self::ACKNOWLEDGEMENT
    }
}

/// Authoritative reads for the authenticated investor.
#[async_trait]
pub trait PortalReader: Send + Sync {
    async fn fetch_investor(&self) -> PortalResult<Investor>;
    async fn fetch_documents(&self) -> PortalResult<Vec<Document>>;
    async fn fetch_gates(&self) -> PortalResult<Gates>;
    async fn fetch_disclaimer(&self) -> PortalResult<DisclaimerDefinition>;
    async fn fetch_raise_config(&self) -> PortalResult<RaiseConfig>;
}

/// Two-phase identity verification plus the operator bypass.
#[async_trait]
pub trait VerificationBackend: Send + Sync {
    /// Open a checkout session that returns the browser to `return_url`.
    async fn start_verification(&self, return_url: &Url) -> PortalResult<RedirectTarget>;

    /// Ask whether the last checkout actually verified the investor. A
    /// positive answer is recorded server-side.
    async fn confirm_verification(&self) -> PortalResult<VerificationOutcome>;

    /// Mark identity verified without a provider check. Returns the new
    /// gate state.
    async fn override_verification(&self, confirmation: &OperatorConfirmation)
        -> PortalResult<Gates>;
}

/// Everything the portal session needs from its backend.
pub trait PortalBackend:
    PortalReader + VerificationBackend + DocumentResolver + DisclaimerAcceptor + IntentBackend
{
}

impl<T> PortalBackend for T where
    T: PortalReader + VerificationBackend + DocumentResolver + DisclaimerAcceptor + IntentBackend
{
}
