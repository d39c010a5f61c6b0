use investor_types::{
    IntentStatus, InvestmentIntent, PortalError, PortalResult, RaiseConfig,
};
use tracing::{debug, info, warn};

use crate::machine::{IntentEvent, IntentStateMachine, IntentStep};
use crate::request::IntentRequest;
use crate::traits::IntentBackend;

/// Local view of the investor's intent plus the operations that move it.
///
/// Holds the last record the backend returned. Nothing here advances the
/// status on its own: every change comes from a backend response.
#[derive(Clone, Debug, Default)]
pub struct IntentWorkflow {
    machine: IntentStateMachine,
    current: Option<InvestmentIntent>,
}

fn progress_rank(status: IntentStatus) -> u8 {
    match status {
        IntentStatus::None => 0,
        IntentStatus::SafeSent | IntentStatus::ConsentPending => 1,
        IntentStatus::Signed => 2,
    }
}

impl IntentWorkflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously fetched (or cached) record.
    pub fn with_intent(intent: Option<InvestmentIntent>) -> Self {
        Self {
            machine: IntentStateMachine::new(),
            current: intent,
        }
    }

    pub fn intent(&self) -> Option<&InvestmentIntent> {
        self.current.as_ref()
    }

    pub fn status(&self) -> IntentStatus {
        self.current
            .as_ref()
            .map(|intent| intent.status)
            .unwrap_or_default()
    }

    pub fn step(&self) -> IntentStep {
        IntentStep::for_intent(self.current.as_ref())
    }

    /// Replace the local view without any checks. Used when an
    /// authoritative read arrives from elsewhere.
    pub fn replace(&mut self, intent: Option<InvestmentIntent>) {
        self.current = intent;
    }

    /// Submit a new intent.
    ///
    /// Checked in order: no intent exists yet, risk acknowledged, amount
    /// meets the minimum. Any failure leaves the status unchanged and makes
    /// no backend call.
    pub async fn submit<B>(
        &mut self,
        backend: &B,
        request: &IntentRequest,
        raise: Option<&RaiseConfig>,
    ) -> PortalResult<&InvestmentIntent>
    where
        B: IntentBackend + ?Sized,
    {
        let from = self.status();
        self.machine.can_submit(from)?;
        let payload = request.validate(raise)?;

        debug!(
            amount = payload.amount,
            payment_method = %payload.payment_method,
            "Submitting investment intent"
        );
        let created = backend.submit_intent(&payload).await?;

        let expected = self
            .machine
            .transition(from, IntentEvent::Submitted(created.signing_method))?;
        if created.status != expected {
            warn!(
                intent_id = %created.id,
                expected = %expected,
                reported = %created.status,
                "Backend reported unexpected status after submission"
            );
        }
        if !created.is_consistent() {
            warn!(
                intent_id = %created.id,
                signing_method = ?created.signing_method,
                "Consent id does not match signing method"
            );
        }

        info!(
            intent_id = %created.id,
            status = %created.status,
            signing_method = ?created.signing_method,
            "Investment intent submitted"
        );
        Ok(&*self.current.insert(created))
    }

    /// Sign the in-app consent with the investor's typed legal name.
    ///
    /// Only valid from `CONSENT_PENDING`. The legal name must be non-empty
    /// after trimming and is never logged.
    pub async fn sign_consent<B>(
        &mut self,
        backend: &B,
        typed_legal_name: &str,
    ) -> PortalResult<&InvestmentIntent>
    where
        B: IntentBackend + ?Sized,
    {
        let from = self.status();
        self.machine.transition(from, IntentEvent::ConsentSigned)?;

        let legal_name = typed_legal_name.trim();
        if legal_name.is_empty() {
            return Err(PortalError::EmptyLegalName);
        }

        let consent_id = self
            .current
            .as_ref()
            .and_then(|intent| intent.consent_id.clone())
            .ok_or(PortalError::InvalidTransition {
                operation: IntentEvent::ConsentSigned.operation(),
                status: from,
            })?;

        let signed = backend.sign_consent(&consent_id, legal_name).await?;
        if signed.status != IntentStatus::Signed {
            warn!(
                intent_id = %signed.id,
                status = %signed.status,
                "Consent accepted but backend did not report SIGNED"
            );
        } else {
            info!(intent_id = %signed.id, consent_id = %consent_id, "Consent signed");
        }
        Ok(&*self.current.insert(signed))
    }

    /// Ask for the external signing link again. Only valid from `SAFE_SENT`.
    pub async fn resend_signing_link<B>(&self, backend: &B) -> PortalResult<()>
    where
        B: IntentBackend + ?Sized,
    {
        self.machine
            .transition(self.status(), IntentEvent::SigningLinkResent)?;
        backend.resend_signing_link().await?;
        info!(
            intent_id = ?self.current.as_ref().map(|i| i.id.as_str()),
            "Signing link resent"
        );
        Ok(())
    }

    /// Re-read the intent from the backend and adopt it.
    ///
    /// This is the only way `SAFE_SENT -> SIGNED` is observed.
    pub async fn refresh<B>(&mut self, backend: &B) -> PortalResult<IntentStatus>
    where
        B: IntentBackend + ?Sized,
    {
        let before = self.status();
        let fetched = backend.fetch_intent().await?;
        let after = fetched.as_ref().map(|i| i.status).unwrap_or_default();

        if progress_rank(after) < progress_rank(before) {
            warn!(
                before = %before,
                after = %after,
                "Intent status went backwards on refresh; adopting backend value"
            );
        } else if before == IntentStatus::SafeSent && after == IntentStatus::Signed {
            info!("External signature observed");
        } else if before != after {
            debug!(before = %before, after = %after, "Intent status changed on refresh");
        }

        self.current = fetched;
        Ok(after)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::MockIntentBackend;
    use investor_types::{ErrorKind, PaymentMethod, SigningMethod};

    fn request(amount: u64) -> IntentRequest {
        IntentRequest::new(amount, PaymentMethod::Wire)
            .accredited(true)
            .risk_acknowledged(true)
    }

    #[tokio::test]
    async fn submit_without_risk_makes_no_call() {
        let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
        let mut workflow = IntentWorkflow::new();
        let raise = RaiseConfig::with_minimum(1000);

        let err = workflow
            .submit(
                &backend,
                &IntentRequest::new(5000, PaymentMethod::Wire),
                Some(&raise),
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::RiskNotAcknowledged);
        assert_eq!(backend.submit_calls(), 0);
        assert_eq!(workflow.status(), IntentStatus::None);
    }

    #[tokio::test]
    async fn existing_intent_checked_before_risk() {
        let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        let err = workflow
            .submit(&backend, &IntentRequest::new(10, PaymentMethod::Ach), None)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntentAlreadyExists);
        assert_eq!(backend.submit_calls(), 1);
    }

    #[tokio::test]
    async fn submit_external_lands_in_safe_sent() {
        let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
        let mut workflow = IntentWorkflow::new();

        let intent = workflow.submit(&backend, &request(5000), None).await.unwrap();
        assert_eq!(intent.status, IntentStatus::SafeSent);
        assert!(intent.consent_id.is_none());
        assert_eq!(workflow.step(), IntentStep::AwaitingExternalSignature);
    }

    #[tokio::test]
    async fn sign_requires_consent_pending() {
        let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
        let mut workflow = IntentWorkflow::new();

        let err = workflow.sign_consent(&backend, "Jane Doe").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);

        workflow.submit(&backend, &request(5000), None).await.unwrap();
        let err = workflow.sign_consent(&backend, "Jane Doe").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(backend.sign_calls(), 0);
    }

    #[tokio::test]
    async fn blank_legal_name_rejected() {
        let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        let err = workflow.sign_consent(&backend, "   ").await.unwrap_err();
        assert_eq!(err, PortalError::EmptyLegalName);
        assert_eq!(workflow.status(), IntentStatus::ConsentPending);
        assert_eq!(backend.sign_calls(), 0);
    }

    #[tokio::test]
    async fn failed_sign_keeps_consent_pending() {
        let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        backend.fail_next_sign();
        let err = workflow.sign_consent(&backend, "Jane Doe").await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(workflow.status(), IntentStatus::ConsentPending);
    }

    #[tokio::test]
    async fn resend_only_from_safe_sent() {
        let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        let err = workflow.resend_signing_link(&backend).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidTransition);
        assert_eq!(backend.resend_calls(), 0);
    }

    #[tokio::test]
    async fn refresh_observes_external_signature() {
        let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        workflow.resend_signing_link(&backend).await.unwrap();
        assert_eq!(backend.resend_calls(), 1);
        assert_eq!(workflow.refresh(&backend).await.unwrap(), IntentStatus::SafeSent);

        backend.complete_external_signature();
        assert_eq!(workflow.refresh(&backend).await.unwrap(), IntentStatus::Signed);
        assert_eq!(workflow.step(), IntentStep::Complete);
    }

    #[tokio::test]
    async fn refresh_adopts_backend_even_when_behind() {
        let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
        let mut workflow = IntentWorkflow::new();
        workflow.submit(&backend, &request(5000), None).await.unwrap();

        backend.clear();
        assert_eq!(workflow.refresh(&backend).await.unwrap(), IntentStatus::None);
        assert!(workflow.intent().is_none());
    }
}
