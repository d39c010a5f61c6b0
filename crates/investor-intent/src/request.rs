use investor_types::{PaymentMethod, PortalError, PortalResult, RaiseConfig};
use serde::{Deserialize, Serialize};

/// What the investor filled in on the investment form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntentRequest {
    /// Smallest currency unit.
    pub amount: u64,
    pub payment_method: PaymentMethod,
    pub accredited_confirmed: bool,
    /// Per-submission risk checkbox. Independent of the portal-wide
    /// disclaimer: that one gates documents, this one gates investing.
    pub risk_acknowledged: bool,
}

/// Body of the submit call. The risk checkbox stays client-side.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitIntentPayload {
    pub amount: u64,
    pub payment_method: PaymentMethod,
    pub accredited_confirmed: bool,
}

impl IntentRequest {
    pub fn new(amount: u64, payment_method: PaymentMethod) -> Self {
        Self {
            amount,
            payment_method,
            accredited_confirmed: false,
            risk_acknowledged: false,
        }
    }

    pub fn accredited(mut self, confirmed: bool) -> Self {
        self.accredited_confirmed = confirmed;
        self
    }

    pub fn risk_acknowledged(mut self, acknowledged: bool) -> Self {
        self.risk_acknowledged = acknowledged;
        self
    }

    /// Advisory client-side checks. The backend re-validates.
    ///
    /// Without a raise configuration only the risk checkbox is checked
    /// and the minimum is left to the backend.
    pub fn validate(&self, raise: Option<&RaiseConfig>) -> PortalResult<SubmitIntentPayload> {
        if !self.risk_acknowledged {
            return Err(PortalError::RiskNotAcknowledged);
        }

        if let Some(raise) = raise {
            if !raise.meets_minimum(self.amount) || self.amount == 0 {
                return Err(PortalError::BelowMinimum {
                    amount: self.amount,
                    minimum: raise.minimum_investment,
                });
            }
        }

        Ok(SubmitIntentPayload {
            amount: self.amount,
            payment_method: self.payment_method,
            accredited_confirmed: self.accredited_confirmed,
        })
    }
}
