use investor_types::{DisclaimerDefinition, DisclaimerVersion, Gates, Investor, MissingGate};

use crate::evaluator::{self, AccessTier};

/// Explicit session state handed to the evaluator and the controller.
///
/// Replaces ambient browser storage: everything the access decision depends
/// on is in this value.
#[derive(Clone, Debug, Default)]
pub struct SessionContext {
    pub investor: Option<Investor>,
    pub gates: Gates,
    /// `None` when the definition fetch failed; evaluation then fails closed.
    pub disclaimer: Option<DisclaimerDefinition>,
}

impl SessionContext {
    pub fn new(gates: Gates, disclaimer: Option<DisclaimerDefinition>) -> Self {
        Self {
            investor: None,
            gates,
            disclaimer,
        }
    }

    pub fn with_investor(mut self, investor: Investor) -> Self {
        self.investor = Some(investor);
        self
    }

    pub fn access_tier(&self) -> AccessTier {
        evaluator::evaluate(&self.gates, self.disclaimer.as_ref())
    }

    pub fn missing_gate(&self) -> Option<MissingGate> {
        evaluator::missing_gate(&self.gates, self.disclaimer.as_ref())
    }

    pub fn current_disclaimer_version(&self) -> Option<&DisclaimerVersion> {
        self.disclaimer.as_ref().map(|d| &d.version)
    }

    /// The investor accepted an older version and must be re-prompted.
    pub fn needs_reacceptance(&self) -> bool {
        match (&self.disclaimer, &self.gates.disclaimer_version) {
            (Some(current), Some(accepted)) => {
                self.gates.disclaimer_accepted && current.version != *accepted
            }
            _ => false,
        }
    }

    /// Replace the current definition with a freshly fetched one.
    pub fn set_disclaimer(&mut self, definition: Option<DisclaimerDefinition>) {
        self.disclaimer = definition;
    }
}
