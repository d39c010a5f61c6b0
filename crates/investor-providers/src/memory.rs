//! In-memory reference backend.
//!
//! Holds one investor's state and re-validates every mutation the way a
//! real backend must, since client-side checks are advisory. Used by the
//! tests and by `investorctl --backend memory`.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use investor_access::{evaluate, DisclaimerAcceptor, DocumentResolver, ResolvedUrl};
use investor_intent::{IntentBackend, SubmitIntentPayload};
use investor_types::{
    ConsentId, DisclaimerDefinition, DisclaimerItem, DisclaimerVersion, Document, DocumentId,
    DocumentTier, Gates, IntentId, IntentStatus, InvestmentIntent, Investor, LocationRef,
    PortalError, PortalResult, RaiseConfig, SigningMethod,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::BackendError;
use crate::traits::{
    OperatorConfirmation, PortalReader, RedirectTarget, VerificationBackend, VerificationOutcome,
};

const CHECKOUT_BASE: &str = "https://verify.invalid/checkout/";
const STORAGE_BASE: &str = "https://storage.invalid/";
const RESOLVED_URL_TTL_MINUTES: i64 = 15;

/// Every backend operation, for call counting and failure injection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    FetchInvestor,
    FetchDocuments,
    FetchGates,
    FetchDisclaimer,
    FetchRaiseConfig,
    FetchIntent,
    ResolveLocation,
    StartVerification,
    ConfirmVerification,
    OverrideVerification,
    AcceptDisclaimer,
    SubmitIntent,
    SignConsent,
    ResendSigningLink,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// How the backend picks a signing method for a new intent.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum SigningPolicy {
    AlwaysExternal,
    #[default]
    AlwaysInApp,
    /// External e-signature at or above `external_from`, in-app below.
    ByAmount { external_from: u64 },
}

impl SigningPolicy {
    pub fn choose(self, amount: u64) -> SigningMethod {
        match self {
            SigningPolicy::AlwaysExternal => SigningMethod::ExternalESign,
            SigningPolicy::AlwaysInApp => SigningMethod::InAppConsent,
            SigningPolicy::ByAmount { external_from } if amount >= external_from => {
                SigningMethod::ExternalESign
            }
            SigningPolicy::ByAmount { .. } => SigningMethod::InAppConsent,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum CheckoutState {
    Idle,
    Pending { session: String },
    Completed { session: String },
}

/// Reference backend for a single authenticated investor.
#[derive(Clone, Debug)]
pub struct InMemoryBackend {
    investor: Arc<RwLock<Investor>>,
    documents: Arc<RwLock<Vec<Document>>>,
    gates: Arc<RwLock<Gates>>,
    disclaimer: Arc<RwLock<DisclaimerDefinition>>,
    raise: Arc<RwLock<RaiseConfig>>,
    intent: Arc<RwLock<Option<InvestmentIntent>>>,
    checkout: Arc<RwLock<CheckoutState>>,
    policy: Arc<RwLock<SigningPolicy>>,
    failures: Arc<RwLock<HashMap<Operation, u32>>>,
    calls: Arc<RwLock<HashMap<Operation, u32>>>,
    minted: Arc<AtomicU64>,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    /// A backend seeded with a demo raise, disclaimer and document set.
    pub fn new() -> Self {
        let mut raise = RaiseConfig::with_minimum(1000);
        raise.instrument = Some("SAFE".into());

        Self {
            investor: Arc::new(RwLock::new(Investor::new(
                "investor-1",
                "Demo Investor",
                "investor@example.com",
            ))),
            documents: Arc::new(RwLock::new(demo_documents())),
            gates: Arc::new(RwLock::new(Gates::empty())),
            disclaimer: Arc::new(RwLock::new(demo_disclaimer("v1"))),
            raise: Arc::new(RwLock::new(raise)),
            intent: Arc::new(RwLock::new(None)),
            checkout: Arc::new(RwLock::new(CheckoutState::Idle)),
            policy: Arc::new(RwLock::new(SigningPolicy::default())),
            failures: Arc::new(RwLock::new(HashMap::new())),
            calls: Arc::new(RwLock::new(HashMap::new())),
            minted: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_policy(self, policy: SigningPolicy) -> Self {
        if let Ok(mut slot) = self.policy.try_write() {
            *slot = policy;
        }
        self
    }

    pub fn with_raise(self, raise: RaiseConfig) -> Self {
        if let Ok(mut slot) = self.raise.try_write() {
            *slot = raise;
        }
        self
    }

    pub fn with_documents(self, documents: Vec<Document>) -> Self {
        if let Ok(mut slot) = self.documents.try_write() {
            *slot = documents;
        }
        self
    }

    pub fn with_disclaimer(self, definition: DisclaimerDefinition) -> Self {
        if let Ok(mut slot) = self.disclaimer.try_write() {
            *slot = definition;
        }
        self
    }

    pub fn with_gates(self, gates: Gates) -> Self {
        if let Ok(mut slot) = self.gates.try_write() {
            *slot = gates;
        }
        self
    }

    // ========== Test hooks ==========

    /// The investor finished the provider's checkout.
    pub async fn complete_verification_checkout(&self) {
        let mut checkout = self.checkout.write().await;
        if let CheckoutState::Pending { session } = &*checkout {
            *checkout = CheckoutState::Completed {
                session: session.clone(),
            };
        }
    }

    /// The external e-signature provider reported completion.
    pub async fn complete_external_signature(&self) {
        let mut intent = self.intent.write().await;
        if let Some(intent) = intent.as_mut() {
            if intent.status == IntentStatus::SafeSent {
                let now = Utc::now();
                intent.status = IntentStatus::Signed;
                intent.signed_at = Some(now);
                intent.updated_at = now;
            }
        }
    }

    /// Publish a new disclaimer definition.
    pub async fn replace_disclaimer(&self, definition: DisclaimerDefinition) {
        *self.disclaimer.write().await = definition;
    }

    /// Fail the next `times` calls of `operation`.
    pub async fn fail_next(&self, operation: Operation, times: u32) {
        self.failures.write().await.insert(operation, times);
    }

    pub async fn calls(&self, operation: Operation) -> u32 {
        self.calls
            .read()
            .await
            .get(&operation)
            .copied()
            .unwrap_or_default()
    }

    pub async fn gates(&self) -> Gates {
        self.gates.read().await.clone()
    }

    pub async fn intent(&self) -> Option<InvestmentIntent> {
        self.intent.read().await.clone()
    }

    // ========== Internals ==========

    /// Count the call and consume an injected failure if one is armed.
    async fn enter(&self, operation: Operation) -> PortalResult<()> {
        *self.calls.write().await.entry(operation).or_default() += 1;

        let mut failures = self.failures.write().await;
        if let Some(remaining) = failures.get_mut(&operation) {
            if *remaining > 0 {
                *remaining -= 1;
                debug!(operation = %operation, "Injected backend failure");
                return Err(BackendError::Injected(operation.to_string()).into());
            }
        }
        Ok(())
    }
}

fn demo_disclaimer(version: &str) -> DisclaimerDefinition {
    DisclaimerDefinition::new(
        version,
        vec![
            DisclaimerItem::required(
                "risk",
                "Risk of loss",
                "Early-stage investments are highly risky and you may lose your entire investment.",
            ),
            DisclaimerItem::required(
                "illiquidity",
                "Illiquidity",
                "There is no public market for these securities and none may ever develop.",
            ),
            DisclaimerItem::optional(
                "updates",
                "Investor updates",
                "Send me periodic investor updates by email.",
            ),
        ],
    )
}

fn demo_documents() -> Vec<Document> {
    vec![
        Document::new(
            "overview",
            "Company overview",
            DocumentTier::Open,
            "Overview",
            LocationRef::direct("https://portal.invalid/docs/overview.pdf"),
        ),
        Document::new(
            "faq",
            "Investor FAQ",
            DocumentTier::Open,
            "Overview",
            LocationRef::storage("public/faq.pdf"),
        ),
        Document::new(
            "financials",
            "Financial statements",
            DocumentTier::Gated,
            "Financials",
            LocationRef::storage("gated/financials-2024.pdf"),
        )
        .with_description("Audited statements and current-year management accounts."),
        Document::new(
            "safe-template",
            "SAFE agreement",
            DocumentTier::Gated,
            "Legal",
            LocationRef::direct("https://portal.invalid/docs/safe.pdf"),
        ),
    ]
}

#[async_trait]
impl PortalReader for InMemoryBackend {
    async fn fetch_investor(&self) -> PortalResult<Investor> {
        self.enter(Operation::FetchInvestor).await?;
        Ok(self.investor.read().await.clone())
    }

    async fn fetch_documents(&self) -> PortalResult<Vec<Document>> {
        self.enter(Operation::FetchDocuments).await?;
        Ok(self.documents.read().await.clone())
    }

    async fn fetch_gates(&self) -> PortalResult<Gates> {
        self.enter(Operation::FetchGates).await?;
        Ok(self.gates.read().await.clone())
    }

    async fn fetch_disclaimer(&self) -> PortalResult<DisclaimerDefinition> {
        self.enter(Operation::FetchDisclaimer).await?;
        Ok(self.disclaimer.read().await.clone())
    }

    async fn fetch_raise_config(&self) -> PortalResult<RaiseConfig> {
        self.enter(Operation::FetchRaiseConfig).await?;
        Ok(self.raise.read().await.clone())
    }
}

#[async_trait]
impl DocumentResolver for InMemoryBackend {
    async fn resolve_location(&self, storage_key: &str) -> PortalResult<ResolvedUrl> {
        self.enter(Operation::ResolveLocation).await?;

        let document = self
            .documents
            .read()
            .await
            .iter()
            .find(|d| matches!(&d.location, LocationRef::Storage { key } if key == storage_key))
            .cloned()
            .ok_or_else(|| PortalError::ResolverFailure {
                document: DocumentId::new(storage_key),
                reason: "unknown storage key".into(),
            })?;

        if document.is_gated() {
            let gates = self.gates.read().await;
            let definition = self.disclaimer.read().await;
            if !evaluate(&*gates, Some(&*definition)).is_full() {
                return Err(PortalError::ResolverFailure {
                    document: document.id,
                    reason: "access gates not satisfied".into(),
                });
            }
        }

        let n = self.minted.fetch_add(1, Ordering::SeqCst);
        Ok(ResolvedUrl {
            url: format!("{}{}?token={}&n={}", STORAGE_BASE, storage_key, Uuid::new_v4(), n),
            expires_at: Some(Utc::now() + Duration::minutes(RESOLVED_URL_TTL_MINUTES)),
        })
    }
}

#[async_trait]
impl DisclaimerAcceptor for InMemoryBackend {
    async fn accept_disclaimer(
        &self,
        version: &DisclaimerVersion,
        checked_item_ids: &[String],
    ) -> PortalResult<()> {
        self.enter(Operation::AcceptDisclaimer).await?;

        let definition = self.disclaimer.read().await.clone();
        if definition.version != *version {
            return Err(PortalError::StaleDisclaimerVersion {
                submitted: version.clone(),
                current: Some(definition.version),
            });
        }
        let missing = definition.missing_required(checked_item_ids);
        if !missing.is_empty() {
            return Err(PortalError::RequiredAcknowledgmentMissing {
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        self.gates
            .write()
            .await
            .mark_disclaimer_accepted(version.clone());
        Ok(())
    }
}

#[async_trait]
impl VerificationBackend for InMemoryBackend {
    async fn start_verification(&self, return_url: &Url) -> PortalResult<RedirectTarget> {
        self.enter(Operation::StartVerification).await?;

        let session = Uuid::new_v4().to_string();
        let mut url = Url::parse(CHECKOUT_BASE)
            .and_then(|base| base.join(&session))
            .map_err(BackendError::from)?;
        url.query_pairs_mut()
            .append_pair("return_to", return_url.as_str());

        *self.checkout.write().await = CheckoutState::Pending { session };
        Ok(RedirectTarget { url })
    }

    async fn confirm_verification(&self) -> PortalResult<VerificationOutcome> {
        self.enter(Operation::ConfirmVerification).await?;

        let mut checkout = self.checkout.write().await;
        let state = checkout.clone();
        let mut gates = self.gates.write().await;
        match state {
            CheckoutState::Completed { session } => {
                debug!(session = %session, "Verification checkout confirmed");
                *checkout = CheckoutState::Idle;
                gates.mark_identity_verified();
                Ok(VerificationOutcome::verified())
            }
            CheckoutState::Pending { .. } => Ok(VerificationOutcome::not_verified(
                "verification checkout was not completed",
            )),
            CheckoutState::Idle if gates.identity_verified => Ok(VerificationOutcome::verified()),
            CheckoutState::Idle => Ok(VerificationOutcome::not_verified(
                "no verification session in progress",
            )),
        }
    }

    async fn override_verification(
        &self,
        confirmation: &OperatorConfirmation,
    ) -> PortalResult<Gates> {
        self.enter(Operation::OverrideVerification).await?;

        if !confirmation.is_valid() {
            return Err(PortalError::OverrideNotPermitted(
                "operator confirmation rejected".into(),
            ));
        }
        let mut gates = self.gates.write().await;
        gates.mark_identity_verified();
        Ok(gates.clone())
    }
}

#[async_trait]
impl IntentBackend for InMemoryBackend {
    async fn fetch_intent(&self) -> PortalResult<Option<InvestmentIntent>> {
        self.enter(Operation::FetchIntent).await?;
        Ok(self.intent.read().await.clone())
    }

    async fn submit_intent(&self, payload: &SubmitIntentPayload) -> PortalResult<InvestmentIntent> {
        self.enter(Operation::SubmitIntent).await?;

        let mut slot = self.intent.write().await;
        if let Some(existing) = slot.as_ref() {
            return Err(PortalError::IntentAlreadyExists {
                status: existing.status,
            });
        }

        let minimum = self.raise.read().await.minimum_investment;
        if payload.amount == 0 || payload.amount < minimum {
            return Err(PortalError::BelowMinimum {
                amount: payload.amount,
                minimum,
            });
        }

        let signing_method = self.policy.read().await.choose(payload.amount);
        let now = Utc::now();
        let intent = InvestmentIntent {
            id: IntentId::generate(),
            investor_id: self.investor.read().await.id.clone(),
            amount: payload.amount,
            payment_method: payload.payment_method,
            accredited_confirmed: payload.accredited_confirmed,
            status: IntentStatus::after_submission(signing_method),
            signing_method,
            consent_id: match signing_method {
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
        self.enter(Operation::SignConsent).await?;

        if typed_legal_name.trim().is_empty() {
            return Err(PortalError::EmptyLegalName);
        }

        let mut slot = self.intent.write().await;
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
        self.enter(Operation::ResendSigningLink).await?;

        let status = self
            .intent
            .read()
            .await
            .as_ref()
            .map(|i| i.status)
            .unwrap_or_default();
        if status != IntentStatus::SafeSent {
            return Err(PortalError::InvalidTransition {
                operation: "resend signing link",
                status,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use investor_types::{ErrorKind, PaymentMethod};

    fn payload(amount: u64) -> SubmitIntentPayload {
        SubmitIntentPayload {
            amount,
            payment_method: PaymentMethod::Wire,
            accredited_confirmed: true,
        }
    }

    #[test]
    fn policy_by_amount() {
        let policy = SigningPolicy::ByAmount {
            external_from: 10_000,
        };
        assert_eq!(policy.choose(9_999), SigningMethod::InAppConsent);
        assert_eq!(policy.choose(10_000), SigningMethod::ExternalESign);
    }

    #[tokio::test]
    async fn submit_revalidates_minimum() {
        let backend = InMemoryBackend::new();
        let err = backend.submit_intent(&payload(500)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::BelowMinimum);
        assert!(backend.intent().await.is_none());
    }

    #[tokio::test]
    async fn submit_rejects_duplicate() {
        let backend = InMemoryBackend::new();
        let first = backend.submit_intent(&payload(5000)).await.unwrap();
        let err = backend.submit_intent(&payload(9000)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IntentAlreadyExists);
        assert_eq!(backend.intent().await, Some(first));
    }

    #[tokio::test]
    async fn injected_failures_are_consumed() {
        let backend = InMemoryBackend::new();
        backend.fail_next(Operation::FetchGates, 2).await;

        assert_eq!(
            backend.fetch_gates().await.unwrap_err().kind(),
            ErrorKind::NetworkFailure
        );
        assert!(backend.fetch_gates().await.is_err());
        assert!(backend.fetch_gates().await.is_ok());
        assert_eq!(backend.calls(Operation::FetchGates).await, 3);
    }

    #[tokio::test]
    async fn gated_storage_key_requires_full_access() {
        let backend = InMemoryBackend::new();
        let err = backend
            .resolve_location("gated/financials-2024.pdf")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ResolverFailure);

        let open = backend.resolve_location("public/faq.pdf").await.unwrap();
        assert!(open.url.starts_with(STORAGE_BASE));
        assert!(open.expires_at.is_some());
    }

    #[tokio::test]
    async fn accept_revalidates_version_and_items() {
        let backend = InMemoryBackend::new();
        let err = backend
            .accept_disclaimer(&DisclaimerVersion::new("v0"), &["risk".into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StaleDisclaimerVersion);

        let err = backend
            .accept_disclaimer(&DisclaimerVersion::new("v1"), &["risk".into()])
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RequiredAcknowledgmentMissing);
        assert!(!backend.gates().await.disclaimer_accepted);
    }

    #[tokio::test]
    async fn resend_requires_safe_sent() {
        let backend = InMemoryBackend::new().with_policy(SigningPolicy::AlwaysExternal);
        assert!(backend.resend_signing_link().await.is_err());

        backend.submit_intent(&payload(5000)).await.unwrap();
        backend.resend_signing_link().await.unwrap();
        assert_eq!(backend.calls(Operation::ResendSigningLink).await, 2);
    }
}
