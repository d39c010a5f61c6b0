use async_trait::async_trait;
use investor_types::{ConsentId, InvestmentIntent, PortalResult};

use crate::request::SubmitIntentPayload;

/// Backend operations behind the intent lifecycle.
///
/// The backend is the source of truth: every returned record replaces the
/// local view.
#[async_trait]
pub trait IntentBackend: Send + Sync {
    /// Current intent, or `None` when nothing was submitted.
    async fn fetch_intent(&self) -> PortalResult<Option<InvestmentIntent>>;

    /// Create the intent; the backend chooses the signing method.
    async fn submit_intent(&self, payload: &SubmitIntentPayload) -> PortalResult<InvestmentIntent>;

    /// Record a typed-name consent signature.
    async fn sign_consent(
        &self,
        consent_id: &ConsentId,
        typed_legal_name: &str,
    ) -> PortalResult<InvestmentIntent>;

    /// Ask the e-signature provider to send the signing link again.
    async fn resend_signing_link(&self) -> PortalResult<()>;
}
