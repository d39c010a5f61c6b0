//! Investor portal session.
//!
//! Owns the explicit session state (gates, disclaimer definition, documents,
//! intent) and runs every portal operation behind its in-flight guard.
//! Local state changes only after the backend confirms.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use investor_access::{
    AccessOutcome, AccessTier, DisclaimerTracker, DocumentAccessController, DocumentEntry,
    ResolvedUrl, ResolverCall, SessionContext,
};
use investor_intent::{IntentRequest, IntentStep, IntentWorkflow};
use investor_providers::{
    detect_return_marker, strip_return_marker, ESignatureAdapter, HttpBackend,
    IdentityVerificationAdapter, InMemoryBackend, OperatorConfirmation, PortalBackend,
    RedirectTarget, SigningChannel,
};
use investor_types::{
    DisclaimerDefinition, DisclaimerVersion, Document, DocumentCategory, DocumentId, ErrorKind,
    Gates, IntentStatus, InvestmentIntent, Investor, InvestorStage, LocationRef, MissingGate,
    PortalError, PortalResult, RaiseConfig,
};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

use crate::cache::{CachedSession, SessionCache};
use crate::config::{BackendKind, PortalConfig};
use crate::error::ConfigError;
use crate::guard::{InFlight, PortalOperation};

/// Build the backend named by the configuration.
pub fn connect_backend(config: &PortalConfig) -> Result<Arc<dyn PortalBackend>, ConfigError> {
    match config.backend.kind {
        BackendKind::Memory => Ok(Arc::new(InMemoryBackend::new())),
        BackendKind::Http => {
            let mut backend =
                HttpBackend::new(&config.backend.url, config.backend.request_timeout())?;
            if let Some(token) = &config.backend.token {
                backend = backend.with_token(token.clone());
            }
            Ok(Arc::new(backend))
        }
    }
}

/// What the shell should render right now.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PortalSnapshot {
    /// False while only the advisory cache has been applied.
    pub authoritative: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub investor: Option<Investor>,
    pub gates: Gates,
    pub access_tier: AccessTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_gate: Option<MissingGate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disclaimer_version: Option<DisclaimerVersion>,
    pub needs_reacceptance: bool,
    pub intent_status: IntentStatus,
    /// Only known once the intent itself has been fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent_step: Option<IntentStep>,
    pub stage: InvestorStage,
}

/// Outcome of opening a document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum DocumentLink {
    Ready(ResolvedUrl),
    Blocked {
        gate: MissingGate,
        prompt: &'static str,
    },
}

/// Result of handling a page load.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PageLoad {
    /// URL the shell should display, with the return marker removed.
    pub canonical_url: Url,
    /// Set when the load carried a fresh return marker.
    pub confirmation: Option<PortalResult<()>>,
}

#[derive(Debug, Default)]
struct PortalState {
    ctx: SessionContext,
    documents: Vec<Document>,
    raise: Option<RaiseConfig>,
    workflow: IntentWorkflow,
    cached: Option<CachedSession>,
    mounted: bool,
    marker_consumed: bool,
}

impl PortalState {
    fn snapshot(&self) -> PortalSnapshot {
        if !self.mounted {
            if let Some(cached) = &self.cached {
                return Self::cached_snapshot(cached);
            }
        }

        let status = self.workflow.status();
        PortalSnapshot {
            authoritative: self.mounted,
            investor: self.ctx.investor.clone(),
            gates: self.ctx.gates.clone(),
            access_tier: self.ctx.access_tier(),
            missing_gate: self.ctx.missing_gate(),
            disclaimer_version: self.ctx.current_disclaimer_version().cloned(),
            needs_reacceptance: self.ctx.needs_reacceptance(),
            intent_status: status,
            intent_step: Some(self.workflow.step()),
            stage: InvestorStage::derive(&self.ctx.gates, status),
        }
    }

    fn cached_snapshot(cached: &CachedSession) -> PortalSnapshot {
        let definition = cached
            .disclaimer_version
            .as_ref()
            .map(|v| DisclaimerDefinition::new(v.as_str(), Vec::new()));
        let ctx = SessionContext::new(cached.gates.clone(), definition);
        PortalSnapshot {
            authoritative: false,
            investor: None,
            gates: cached.gates.clone(),
            access_tier: ctx.access_tier(),
            missing_gate: ctx.missing_gate(),
            disclaimer_version: cached.disclaimer_version.clone(),
            needs_reacceptance: ctx.needs_reacceptance(),
            intent_status: cached.intent_status,
            intent_step: None,
            stage: InvestorStage::derive(&cached.gates, cached.intent_status),
        }
    }

    fn to_cached(&self) -> CachedSession {
        CachedSession {
            investor_id: self.ctx.investor.as_ref().map(|i| i.id.clone()),
            gates: self.ctx.gates.clone(),
            intent_status: self.workflow.status(),
            disclaimer_version: self.ctx.current_disclaimer_version().cloned(),
            saved_at: Utc::now(),
        }
    }
}

/// The investor portal session orchestrator.
pub struct InvestorPortal {
    backend: Arc<dyn PortalBackend>,
    verification: IdentityVerificationAdapter,
    esign: ESignatureAdapter,
    controller: DocumentAccessController,
    tracker: DisclaimerTracker,
    portal_url: Url,
    cache: Option<Arc<dyn SessionCache>>,
    in_flight: InFlight,
    state: RwLock<PortalState>,
}

impl InvestorPortal {
    pub fn new(backend: Arc<dyn PortalBackend>, portal_url: Url) -> Self {
        Self {
            backend,
            verification: IdentityVerificationAdapter::default(),
            esign: ESignatureAdapter::new(),
            controller: DocumentAccessController::new(),
            tracker: DisclaimerTracker::new(),
            portal_url,
            cache: None,
            in_flight: InFlight::new(),
            state: RwLock::new(PortalState::default()),
        }
    }

    pub fn from_config(
        backend: Arc<dyn PortalBackend>,
        config: &PortalConfig,
    ) -> Result<Self, ConfigError> {
        let portal = Self::new(backend, config.portal_url()?).with_verification(
            IdentityVerificationAdapter::new(
                config.portal.return_param.clone(),
                config.verification.allow_operator_override,
            ),
        );
        Ok(portal)
    }

    pub fn with_verification(mut self, adapter: IdentityVerificationAdapter) -> Self {
        self.verification = adapter;
        self
    }

    pub fn with_cache(mut self, cache: Arc<dyn SessionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn portal_url(&self) -> &Url {
        &self.portal_url
    }

    // ========== Session ==========

    /// Show the cached view, if any, before anything is fetched.
    pub async fn restore_cached(&self) -> Option<PortalSnapshot> {
        let cached = self.load_cache()?;
        let mut state = self.state.write().await;
        let snapshot = PortalState::cached_snapshot(&cached);
        state.cached = Some(cached);
        Some(snapshot)
    }

    /// Authoritative fetch of everything the portal renders.
    ///
    /// Supersedes whatever the cache said. A failed disclaimer fetch is not
    /// fatal: the session keeps no definition and gated documents stay
    /// locked.
    pub async fn mount(&self) -> PortalResult<PortalSnapshot> {
        let _guard = self.in_flight.acquire(PortalOperation::Mount)?;
        {
            let mut state = self.state.write().await;
            if state.cached.is_none() {
                state.cached = self.load_cache();
            }
        }

        let backend = &*self.backend;
        let investor = backend.fetch_investor().await?;
        let gates = backend.fetch_gates().await?;
        let disclaimer = match backend.fetch_disclaimer().await {
            Ok(definition) => Some(definition),
            Err(err) => {
                warn!(error = %err, "Disclaimer definition unavailable, gated documents stay locked");
                None
            }
        };
        let documents = backend.fetch_documents().await?;
        let raise = match backend.fetch_raise_config().await {
            Ok(raise) => Some(raise),
            Err(err) => {
                warn!(error = %err, "Raise configuration unavailable, minimum left to the backend");
                None
            }
        };
        let intent = backend.fetch_intent().await?;

        let mut state = self.state.write().await;
        if let Some(cached) = &state.cached {
            let status = intent.as_ref().map(|i| i.status).unwrap_or_default();
            if cached.gates != gates || cached.intent_status != status {
                debug!("Authoritative state superseded the cached view");
            }
        }

        state.ctx = SessionContext::new(gates, disclaimer).with_investor(investor);
        state.documents = documents;
        state.raise = raise;
        state.workflow.replace(intent);
        state.mounted = true;

        info!(
            investor_id = ?state.ctx.investor.as_ref().map(|i| i.id.as_str()),
            access_tier = ?state.ctx.access_tier(),
            status = %state.workflow.status(),
            documents = state.documents.len(),
            "Portal mounted"
        );
        self.persist(&state);
        Ok(state.snapshot())
    }

    pub async fn snapshot(&self) -> PortalSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn progress(&self) -> InvestorStage {
        self.snapshot().await.stage
    }

    // ========== Documents ==========

    /// Every document with its access outcome for this session.
    pub async fn document_listing(&self) -> Vec<DocumentEntry> {
        let state = self.state.read().await;
        self.controller.list(&state.documents, &state.ctx)
    }

    pub async fn documents_by_category(&self) -> BTreeMap<DocumentCategory, Vec<DocumentEntry>> {
        let state = self.state.read().await;
        self.controller.by_category(&state.documents, &state.ctx)
    }

    /// Open a document: a retrieval URL, or the gate to prompt.
    ///
    /// A resolver failure never touches gate state.
    pub async fn open_document(&self, id: &DocumentId) -> PortalResult<DocumentLink> {
        let _guard = self.in_flight.acquire(PortalOperation::OpenDocument)?;

        let outcome = {
            let state = self.state.read().await;
            let document = state
                .documents
                .iter()
                .find(|d| &d.id == id)
                .ok_or_else(|| PortalError::UnknownDocument(id.clone()))?;
            self.controller.resolve(document, &state.ctx)
        };

        let call = match outcome {
            AccessOutcome::Blocked(gate) => {
                info!(document_id = %id, gate = %gate, "Document blocked");
                return Ok(DocumentLink::Blocked {
                    gate,
                    prompt: gate.prompt(),
                });
            }
            AccessOutcome::Open(LocationRef::Direct { url }) => {
                return Ok(DocumentLink::Ready(ResolvedUrl::permanent(url)));
            }
            AccessOutcome::Open(location) => ResolverCall::new(id.clone(), location),
            AccessOutcome::Resolvable(call) => call,
        };

        let resolved = call.execute(&*self.backend).await?;
        debug!(document_id = %id, "Document resolved");
        Ok(DocumentLink::Ready(resolved))
    }

    // ========== Identity verification ==========

    /// Begin verification; the shell replaces the page with the target.
    pub async fn start_verification(&self) -> PortalResult<RedirectTarget> {
        let _guard = self.in_flight.acquire(PortalOperation::StartVerification)?;
        let target = self
            .verification
            .start(&*self.backend, &self.portal_url)
            .await?;
        self.state.write().await.marker_consumed = false;
        Ok(target)
    }

    /// Process a page load.
    ///
    /// The return marker is always stripped from the canonical URL. It
    /// triggers a confirmation until one gives a definitive answer
    /// (verified or not verified); a transient failure leaves it live so
    /// reloading the same URL tries again. A load that arrives while a
    /// confirmation is already running only gets the canonical URL.
    pub async fn handle_page_load(&self, url: &Url) -> PortalResult<PageLoad> {
        let param = self.verification.return_param();
        if !detect_return_marker(url, param) {
            return Ok(PageLoad {
                canonical_url: url.clone(),
                confirmation: None,
            });
        }

        let canonical_url = strip_return_marker(url, param);
        let _guard = match self.in_flight.acquire(PortalOperation::ConfirmVerification) {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Verification confirmation already in flight");
                return Ok(PageLoad {
                    canonical_url,
                    confirmation: None,
                });
            }
        };

        if self.state.read().await.marker_consumed {
            debug!("Verification return marker already processed");
            return Ok(PageLoad {
                canonical_url,
                confirmation: None,
            });
        }

        let result = self.confirm_identity().await;
        let definitive = match &result {
            Ok(()) => true,
            Err(err) => err.kind() == ErrorKind::VerificationNotConfirmed,
        };
        if definitive {
            self.state.write().await.marker_consumed = true;
        }

        Ok(PageLoad {
            canonical_url,
            confirmation: Some(result),
        })
    }

    /// Ask the backend again whether the last checkout verified the
    /// investor, without needing the return marker.
    pub async fn retry_verification_confirmation(&self) -> PortalResult<()> {
        let _guard = self
            .in_flight
            .acquire(PortalOperation::ConfirmVerification)?;
        self.confirm_identity().await
    }

    /// Caller holds the `ConfirmVerification` guard.
    async fn confirm_identity(&self) -> PortalResult<()> {
        let mut gates = self.state.read().await.ctx.gates.clone();
        self.verification.confirm(&*self.backend, &mut gates).await?;

        let mut state = self.state.write().await;
        state.ctx.gates.mark_identity_verified();
        self.persist(&state);
        Ok(())
    }

    /// Operator-confirmed bypass of identity verification.
    pub async fn operator_verify(&self, confirmation: &OperatorConfirmation) -> PortalResult<()> {
        let _guard = self.in_flight.acquire(PortalOperation::OperatorOverride)?;
        let mut gates = self.state.read().await.ctx.gates.clone();
        self.verification
            .operator_override(&*self.backend, &mut gates, confirmation)
            .await?;

        let mut state = self.state.write().await;
        state.ctx.gates.mark_identity_verified();
        self.persist(&state);
        Ok(())
    }

    // ========== Disclaimer ==========

    pub async fn disclaimer(&self) -> Option<DisclaimerDefinition> {
        self.state.read().await.ctx.disclaimer.clone()
    }

    pub async fn accept_disclaimer(
        &self,
        checked_item_ids: &[String],
        definition_version: &DisclaimerVersion,
    ) -> PortalResult<()> {
        let _guard = self.in_flight.acquire(PortalOperation::AcceptDisclaimer)?;
        let mut ctx = self.state.read().await.ctx.clone();
        self.tracker
            .accept(&*self.backend, &mut ctx, checked_item_ids, definition_version)
            .await?;

        let mut state = self.state.write().await;
        state
            .ctx
            .gates
            .mark_disclaimer_accepted(definition_version.clone());
        self.persist(&state);
        Ok(())
    }

    // ========== Investment intent ==========

    pub async fn raise_config(&self) -> Option<RaiseConfig> {
        self.state.read().await.raise.clone()
    }

    pub async fn intent(&self) -> Option<InvestmentIntent> {
        self.state.read().await.workflow.intent().cloned()
    }

    pub async fn signing_channel(&self) -> SigningChannel {
        let state = self.state.read().await;
        self.esign.channel(state.workflow.intent())
    }

    pub async fn submit_intent(&self, request: &IntentRequest) -> PortalResult<InvestmentIntent> {
        let _guard = self.in_flight.acquire(PortalOperation::SubmitIntent)?;
        let (mut workflow, raise) = {
            let state = self.state.read().await;
            (state.workflow.clone(), state.raise.clone())
        };

        let intent = workflow
            .submit(&*self.backend, request, raise.as_ref())
            .await?
            .clone();
        self.apply_workflow(workflow).await;
        Ok(intent)
    }

    pub async fn sign_consent(&self, typed_legal_name: &str) -> PortalResult<IntentStatus> {
        let _guard = self.in_flight.acquire(PortalOperation::SignConsent)?;
        let mut workflow = self.workflow().await;
        let status = self
            .esign
            .sign_in_app(&*self.backend, &mut workflow, typed_legal_name)
            .await?;
        self.apply_workflow(workflow).await;
        Ok(status)
    }

    pub async fn resend_signing_link(&self) -> PortalResult<()> {
        let _guard = self.in_flight.acquire(PortalOperation::ResendSigningLink)?;
        let workflow = self.workflow().await;
        self.esign.resend_link(&*self.backend, &workflow).await
    }

    /// Re-read the intent; the only way an external signature is observed.
    pub async fn refresh_intent(&self) -> PortalResult<IntentStatus> {
        let _guard = self.in_flight.acquire(PortalOperation::RefreshIntent)?;
        let mut workflow = self.workflow().await;
        self.esign.poll(&*self.backend, &mut workflow).await?;
        let status = workflow.status();
        self.apply_workflow(workflow).await;
        Ok(status)
    }

    /// Working copy of the intent view; backend calls run on it unlocked.
    async fn workflow(&self) -> IntentWorkflow {
        self.state.read().await.workflow.clone()
    }

    /// Install the record the backend just confirmed.
    async fn apply_workflow(&self, workflow: IntentWorkflow) {
        let mut state = self.state.write().await;
        state.workflow.replace(workflow.intent().cloned());
        self.persist(&state);
    }

    // ========== Cache ==========

    fn load_cache(&self) -> Option<CachedSession> {
        let cache = self.cache.as_ref()?;
        match cache.load() {
            Ok(cached) => cached,
            Err(err) => {
                warn!(error = %err, "Ignoring unreadable session cache");
                None
            }
        }
    }

    fn persist(&self, state: &PortalState) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(err) = cache.store(&state.to_cached()) {
            warn!(error = %err, "Failed to update session cache");
        }
    }
}
