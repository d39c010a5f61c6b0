use serde::{Deserialize, Serialize};

use crate::gates::Gates;
use crate::ids::InvestorId;
use crate::intent::IntentStatus;

/// Position of an investor in the portal journey.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestorStage {
    #[default]
    Prospect,
    Verified,
    Acknowledged,
    Committed,
    Invested,
}

impl InvestorStage {
    /// Journey position implied by gate state and intent status.
    ///
    /// Display-only; the authentication backend owns the stored stage.
    pub fn derive(gates: &Gates, status: IntentStatus) -> Self {
        match status {
            IntentStatus::Signed => InvestorStage::Invested,
            IntentStatus::SafeSent | IntentStatus::ConsentPending => InvestorStage::Committed,
            IntentStatus::None if gates.identity_verified && gates.disclaimer_accepted => {
                InvestorStage::Acknowledged
            }
            IntentStatus::None if gates.identity_verified => InvestorStage::Verified,
            IntentStatus::None => InvestorStage::Prospect,
        }
    }
}

/// The person interacting with the portal. Read-only to the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Investor {
    pub id: InvestorId,
    pub display_name: String,
    pub email: String,
    #[serde(default)]
    pub stage: InvestorStage,
}

impl Investor {
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            id: InvestorId::new(id),
            display_name: display_name.into(),
            email: email.into(),
            stage: InvestorStage::Prospect,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::DisclaimerVersion;

    #[test]
    fn stage_progresses_with_gates() {
        let mut gates = Gates::empty();
        assert_eq!(InvestorStage::derive(&gates, IntentStatus::None), InvestorStage::Prospect);

        gates.mark_identity_verified();
        assert_eq!(InvestorStage::derive(&gates, IntentStatus::None), InvestorStage::Verified);

        gates.mark_disclaimer_accepted(DisclaimerVersion::new("v1"));
        assert_eq!(
            InvestorStage::derive(&gates, IntentStatus::None),
            InvestorStage::Acknowledged
        );
    }

    #[test]
    fn intent_status_dominates_gates() {
        let gates = Gates::empty();
        assert_eq!(
            InvestorStage::derive(&gates, IntentStatus::SafeSent),
            InvestorStage::Committed
        );
        assert_eq!(InvestorStage::derive(&gates, IntentStatus::Signed), InvestorStage::Invested);
    }
}
