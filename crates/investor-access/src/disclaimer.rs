use investor_types::{DisclaimerDefinition, DisclaimerVersion, PortalError, PortalResult};
use tracing::{info, warn};

use crate::session::SessionContext;
use crate::traits::DisclaimerAcceptor;

/// A validated acceptance, ready to send.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptanceRequest {
    pub version: DisclaimerVersion,
    pub checked_item_ids: Vec<String>,
}

/// Disclaimer Acceptance Tracker.
///
/// Validation happens entirely client-side; a request that fails it never
/// reaches the backend.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisclaimerTracker;

impl DisclaimerTracker {
    pub fn new() -> Self {
        Self
    }

    /// Check an acceptance against the latest fetched definition.
    ///
    /// Stale versions are rejected before required items are checked, since
    /// the item list belongs to the version.
    pub fn validate(
        &self,
        current: Option<&DisclaimerDefinition>,
        checked_item_ids: &[String],
        definition_version: &DisclaimerVersion,
    ) -> PortalResult<AcceptanceRequest> {
        let definition = match current {
            Some(def) if def.version == *definition_version => def,
            other => {
                return Err(PortalError::StaleDisclaimerVersion {
                    submitted: definition_version.clone(),
                    current: other.map(|d| d.version.clone()),
                });
            }
        };

        let missing = definition.missing_required(checked_item_ids);
        if !missing.is_empty() {
            return Err(PortalError::RequiredAcknowledgmentMissing {
                missing: missing.into_iter().map(String::from).collect(),
            });
        }

        let mut checked: Vec<String> = Vec::with_capacity(checked_item_ids.len());
        for id in checked_item_ids {
            let known = definition.items.iter().any(|item| item.id == *id);
            if known && !checked.contains(id) {
                checked.push(id.clone());
            }
        }

        Ok(AcceptanceRequest {
            version: definition.version.clone(),
            checked_item_ids: checked,
        })
    }

    /// Validate, send, and on confirmation record the acceptance in `ctx`.
    pub async fn accept<A>(
        &self,
        acceptor: &A,
        ctx: &mut SessionContext,
        checked_item_ids: &[String],
        definition_version: &DisclaimerVersion,
    ) -> PortalResult<()>
    where
        A: DisclaimerAcceptor + ?Sized,
    {
        let request = self
            .validate(ctx.disclaimer.as_ref(), checked_item_ids, definition_version)
            .map_err(|err| {
                warn!(version = %definition_version, error = %err, "Disclaimer acceptance rejected");
                err
            })?;

        acceptor
            .accept_disclaimer(&request.version, &request.checked_item_ids)
            .await?;

        ctx.gates.mark_disclaimer_accepted(request.version.clone());
        info!(version = %request.version, "Disclaimer accepted");
        Ok(())
    }
}
