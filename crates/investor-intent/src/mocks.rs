use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use investor_types::{
    ConsentId, IntentId, IntentStatus, InvestmentIntent, InvestorId, PortalError, PortalResult,
    SigningMethod,
};

use crate::request::SubmitIntentPayload;
use crate::traits::IntentBackend;

/// Mock intent backend for testing.
///
/// Holds a single investor's intent and always picks the signing method it
/// was built with. Rejects a second submission the way a real backend does.
pub struct MockIntentBackend {
    signing_method: SigningMethod,
    intent: Mutex<Option<InvestmentIntent>>,
    fail_next_sign: AtomicBool,
    submit_calls: AtomicUsize,
    sign_calls: AtomicUsize,
    resend_calls: AtomicUsize,
}

impl MockIntentBackend {
    pub fn new(signing_method: SigningMethod) -> Self {
        Self {
            signing_method,
            intent: Mutex::new(None),
            fail_next_sign: AtomicBool::new(false),
            submit_calls: AtomicUsize::new(0),
            sign_calls: AtomicUsize::new(0),
            resend_calls: AtomicUsize::new(0),
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn sign_calls(&self) -> usize {
        self.sign_calls.load(Ordering::SeqCst)
    }

    pub fn resend_calls(&self) -> usize {
        self.resend_calls.load(Ordering::SeqCst)
    }

    /// Make the next `sign_consent` fail with a network failure.
    pub fn fail_next_sign(&self) {
        self.fail_next_sign.store(true, Ordering::SeqCst);
    }

    /// Simulate the external provider reporting a completed signature.
    pub fn complete_external_signature(&self) {
        if let Ok(mut slot) = self.intent.lock() {
            if let Some(intent) = slot.as_mut() {
                if intent.status == IntentStatus::SafeSent {
                    let now = Utc::now();
                    intent.status = IntentStatus::Signed;
                    intent.signed_at = Some(now);
                    intent.updated_at = now;
                }
            }
        }
    }

    /// Forget the stored intent.
    pub fn clear(&self) {
        if let Ok(mut slot) = self.intent.lock() {
            *slot = None;
        }
    }

    pub fn stored(&self) -> Option<InvestmentIntent> {
        self.intent.lock().ok().and_then(|slot| slot.clone())
    }

    fn lock_poisoned() -> PortalError {
        PortalError::NetworkFailure("mock intent backend lock poisoned".into())
    }
}

#[async_trait]
impl IntentBackend for MockIntentBackend {
    async fn fetch_intent(&self) -> PortalResult<Option<InvestmentIntent>> {
        Ok(self.stored())
    }

    async fn submit_intent(&self, payload: &SubmitIntentPayload) -> PortalResult<InvestmentIntent> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        let mut slot = self.intent.lock().map_err(|_| Self::lock_poisoned())?;

        if let Some(existing) = slot.as_ref() {
            return Err(PortalError::IntentAlreadyExists {
                status: existing.status,
            });
        }

        let now = Utc::now();
        let intent = InvestmentIntent {
            id: IntentId::generate(),
            investor_id: InvestorId::new("investor-mock"),
            amount: payload.amount,
            payment_method: payload.payment_method,
            accredited_confirmed: payload.accredited_confirmed,
            status: IntentStatus::after_submission(self.signing_method),
            signing_method: self.signing_method,
            consent_id: match self.signing_method {
                SigningMethod::InAppConsent => Some(ConsentId::generate()),
                SigningMethod::ExternalESign => None,
            },
            created_at: now,
            updated_at: now,
            signed_at: None,
        };
        *slot = Some(intent.clone());
        Ok(intent)
    }

    async fn sign_consent(
        &self,
        consent_id: &ConsentId,
        typed_legal_name: &str,
    ) -> PortalResult<InvestmentIntent> {
        self.sign_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_sign.swap(false, Ordering::SeqCst) {
            return Err(PortalError::NetworkFailure("mock sign unavailable".into()));
        }
        if typed_legal_name.trim().is_empty() {
            return Err(PortalError::EmptyLegalName);
        }

        let mut slot = self.intent.lock().map_err(|_| Self::lock_poisoned())?;
        let intent = match slot.as_mut() {
            Some(intent)
                if intent.status == IntentStatus::ConsentPending
                    && intent.consent_id.as_ref() == Some(consent_id) =>
            {
                intent
            }
            other => {
                return Err(PortalError::InvalidTransition {
                    operation: "sign consent",
                    status: other.map(|i| i.status).unwrap_or_default(),
                });
            }
        };

        let now = Utc::now();
        intent.status = IntentStatus::Signed;
        intent.signed_at = Some(now);
        intent.updated_at = now;
        Ok(intent.clone())
    }

    async fn resend_signing_link(&self) -> PortalResult<()> {
        self.resend_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
