use std::collections::BTreeMap;

use investor_types::{
    Document, DocumentCategory, DocumentId, DocumentTier, Gates, LocationRef, MissingGate,
    PortalError, PortalResult,
};
use tracing::{debug, warn};

use crate::evaluator::AccessTier;
use crate::session::SessionContext;
use crate::traits::{DocumentResolver, ResolvedUrl};

/// Result of asking for a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Tier 1: retrievable by anyone.
    Open(LocationRef),
    /// Tier 2 without full access; names the gate to prompt.
    Blocked(MissingGate),
    /// Tier 2 with full access; needs one resolver exchange.
    Resolvable(ResolverCall),
}

impl AccessOutcome {
    pub fn is_blocked(&self) -> bool {
        matches!(self, AccessOutcome::Blocked(_))
    }

    pub fn missing_gate(&self) -> Option<MissingGate> {
        match self {
            AccessOutcome::Blocked(gate) => Some(*gate),
            _ => None,
        }
    }
}

/// A pending exchange of a document location for a retrieval URL.
///
/// Executing it makes at most two attempts: one silent retry, after which
/// the failure is surfaced as [`PortalError::ResolverFailure`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverCall {
    pub document_id: DocumentId,
    pub location: LocationRef,
}

impl ResolverCall {
    pub fn new(document_id: DocumentId, location: LocationRef) -> Self {
        Self {
            document_id,
            location,
        }
    }

    pub async fn execute<R>(&self, resolver: &R) -> PortalResult<ResolvedUrl>
    where
        R: DocumentResolver + ?Sized,
    {
        let key = match &self.location {
            LocationRef::Direct { url } => return Ok(ResolvedUrl::permanent(url.clone())),
            LocationRef::Storage { key } => key,
        };

        match resolver.resolve_location(key).await {
            Ok(resolved) => return Ok(resolved),
            Err(first) => {
                debug!(
                    document_id = %self.document_id,
                    error = %first,
                    "Resolver call failed, retrying once"
                );
            }
        }

        resolver.resolve_location(key).await.map_err(|second| {
            warn!(
                document_id = %self.document_id,
                error = %second,
                "Resolver call failed twice"
            );
            PortalError::ResolverFailure {
                document: self.document_id.clone(),
                reason: second.to_string(),
            }
        })
    }
}

/// A document paired with its access outcome for the current session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentEntry {
    pub document: Document,
    pub outcome: AccessOutcome,
}

/// Document Access Controller.
///
/// Stateless: every decision is computed from the document and the gate
/// state passed in. Never mutates gates.
#[derive(Clone, Copy, Debug, Default)]
pub struct DocumentAccessController;

impl DocumentAccessController {
    pub fn new() -> Self {
        Self
    }

    /// Resolve a document against an access tier and the gates it came from.
    pub fn resolve_with(&self, document: &Document, tier: AccessTier, gates: &Gates) -> AccessOutcome {
        match document.tier {
            DocumentTier::Open => AccessOutcome::Open(document.location.clone()),
            DocumentTier::Gated if tier.is_full() => AccessOutcome::Resolvable(ResolverCall::new(
                document.id.clone(),
                document.location.clone(),
            )),
            DocumentTier::Gated => {
                let gate = if gates.identity_verified {
                    MissingGate::Disclaimer
                } else {
                    MissingGate::Identity
                };
                AccessOutcome::Blocked(gate)
            }
        }
    }

    /// Resolve a document for the given session.
    pub fn resolve(&self, document: &Document, ctx: &SessionContext) -> AccessOutcome {
        self.resolve_with(document, ctx.access_tier(), &ctx.gates)
    }

    /// Pair every document with its outcome, preserving input order.
    pub fn list(&self, documents: &[Document], ctx: &SessionContext) -> Vec<DocumentEntry> {
        let tier = ctx.access_tier();
        documents
            .iter()
            .map(|document| DocumentEntry {
                document: document.clone(),
                outcome: self.resolve_with(document, tier, &ctx.gates),
            })
            .collect()
    }

    /// Listing grouped by category; order within a category is preserved.
    pub fn by_category(
        &self,
        documents: &[Document],
        ctx: &SessionContext,
    ) -> BTreeMap<DocumentCategory, Vec<DocumentEntry>> {
        let mut grouped: BTreeMap<DocumentCategory, Vec<DocumentEntry>> = BTreeMap::new();
        for entry in self.list(documents, ctx) {
            grouped
                .entry(entry.document.category.clone())
                .or_default()
                .push(entry);
        }
        grouped
    }
}
