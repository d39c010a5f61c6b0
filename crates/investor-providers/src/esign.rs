//! E-Signature adapter.
//!
//! Presents the signing path the backend chose for an intent and routes the
//! signing actions through the intent workflow, so every status change still
//! comes from a backend response.

use chrono::{DateTime, Utc};
use investor_intent::{IntentBackend, IntentEvent, IntentWorkflow};
use investor_types::{
    ConsentId, IntentStatus, InvestmentIntent, PortalError, PortalResult, SigningMethod,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How the current intent gets (or got) signed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum SigningChannel {
    /// No intent yet.
    NotStarted,
    /// Instrument sent to the external provider; completion is observed by
    /// re-reading the intent.
    External,
    /// Typed-name consent collected in the portal.
    InApp { consent_id: ConsentId },
    /// Signature reported by the backend.
    Completed {
        method: SigningMethod,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        signed_at: Option<DateTime<Utc>>,
    },
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ESignatureAdapter;

impl ESignatureAdapter {
    pub fn new() -> Self {
        Self
    }

    pub fn channel(&self, intent: Option<&InvestmentIntent>) -> SigningChannel {
        let Some(intent) = intent else {
            return SigningChannel::NotStarted;
        };

        match (intent.status, &intent.consent_id) {
            (IntentStatus::None, _) => SigningChannel::NotStarted,
            (IntentStatus::Signed, _) => SigningChannel::Completed {
                method: intent.signing_method,
                signed_at: intent.signed_at,
            },
            (IntentStatus::ConsentPending, Some(consent_id)) => SigningChannel::InApp {
                consent_id: consent_id.clone(),
            },
            (IntentStatus::ConsentPending, None) | (IntentStatus::SafeSent, _) => {
                SigningChannel::External
            }
        }
    }

    /// Sign in-app with the typed legal name.
    pub async fn sign_in_app<B>(
        &self,
        backend: &B,
        workflow: &mut IntentWorkflow,
        typed_legal_name: &str,
    ) -> PortalResult<IntentStatus>
    where
        B: IntentBackend + ?Sized,
    {
        if let SigningChannel::External = self.channel(workflow.intent()) {
            return Err(PortalError::InvalidTransition {
                operation: IntentEvent::ConsentSigned.operation(),
                status: workflow.status(),
            });
        }
        let intent = workflow.sign_consent(backend, typed_legal_name).await?;
        Ok(intent.status)
    }

    /// Resend the external provider's signing link.
    pub async fn resend_link<B>(&self, backend: &B, workflow: &IntentWorkflow) -> PortalResult<()>
    where
        B: IntentBackend + ?Sized,
    {
        workflow.resend_signing_link(backend).await
    }

    /// Re-read the intent to observe an external signature.
    pub async fn poll<B>(&self, backend: &B, workflow: &mut IntentWorkflow) -> PortalResult<SigningChannel>
    where
        B: IntentBackend + ?Sized,
    {
        let status = workflow.refresh(backend).await?;
        debug!(status = %status, "Signing status polled");
        Ok(self.channel(workflow.intent()))
    }
}
