//! Identity Verification adapter.
//!
//! Two-phase protocol around a checkout-style provider:
//!
//! 1. [`IdentityVerificationAdapter::start`] returns a [`RedirectTarget`];
//!    the caller replaces the whole page with it.
//! 2. After the provider sends the browser back with the return marker,
//!    [`IdentityVerificationAdapter::confirm`] asks the backend whether the
//!    check really succeeded.
//!
//! No in-memory state is carried between the phases, so a full page reload
//! in between is harmless.

use investor_types::{Gates, PortalError, PortalResult};
use tracing::{info, warn};
use url::Url;

use crate::marker::{with_return_marker, DEFAULT_RETURN_PARAM};
use crate::traits::{OperatorConfirmation, RedirectTarget, VerificationBackend};

#[derive(Clone, Debug)]
pub struct IdentityVerificationAdapter {
    return_param: String,
    allow_operator_override: bool,
}

impl Default for IdentityVerificationAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RETURN_PARAM, false)
    }
}

impl IdentityVerificationAdapter {
    pub fn new(return_param: impl Into<String>, allow_operator_override: bool) -> Self {
        Self {
            return_param: return_param.into(),
            allow_operator_override,
        }
    }

    pub fn return_param(&self) -> &str {
        &self.return_param
    }

    pub fn allows_operator_override(&self) -> bool {
        self.allow_operator_override
    }

    /// Begin a verification that returns to `portal_url`.
    pub async fn start<B>(&self, backend: &B, portal_url: &Url) -> PortalResult<RedirectTarget>
    where
        B: VerificationBackend + ?Sized,
    {
        let return_url = with_return_marker(portal_url, &self.return_param);
        let target = backend.start_verification(&return_url).await?;
        info!(
            host = target.url.host_str().unwrap_or_default(),
            "Identity verification started"
        );
        Ok(target)
    }

    /// Confirm a verification after the return marker was seen.
    ///
    /// Flips `gates.identity_verified` only on a positive backend answer.
    /// A negative answer leaves the gate untouched.
    pub async fn confirm<B>(&self, backend: &B, gates: &mut Gates) -> PortalResult<()>
    where
        B: VerificationBackend + ?Sized,
    {
        let outcome = backend.confirm_verification().await?;
        if !outcome.verified {
            let reason = outcome
                .reason
                .unwrap_or_else(|| "verification provider did not report success".into());
            warn!(reason = %reason, "Identity verification not confirmed");
            return Err(PortalError::VerificationNotConfirmed(reason));
        }

        gates.mark_identity_verified();
        info!("Identity verification confirmed");
        Ok(())
    }

    /// Operator bypass for environments without a live provider.
    ///
    /// Separate from [`confirm`](Self::confirm) and never reached from a
    /// provider failure.
    pub async fn operator_override<B>(
        &self,
        backend: &B,
        gates: &mut Gates,
        confirmation: &OperatorConfirmation,
    ) -> PortalResult<()>
    where
        B: VerificationBackend + ?Sized,
    {
        if !self.allow_operator_override {
            return Err(PortalError::OverrideNotPermitted(
                "operator override is disabled in this environment".into(),
            ));
        }
        if !confirmation.is_valid() {
            return Err(PortalError::OverrideNotPermitted(
                "operator name and the exact acknowledgement phrase are required".into(),
            ));
        }

        let updated = backend.override_verification(confirmation).await?;
        if !updated.identity_verified {
            return Err(PortalError::VerificationNotConfirmed(
                "backend did not record the operator override".into(),
            ));
        }

        warn!(
            operator = %confirmation.operator,
            "Identity verification bypassed by operator override"
        );
        gates.supersede_with(updated);
        Ok(())
    }
}
