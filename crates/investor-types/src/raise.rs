use serde::{Deserialize, Serialize};

/// Parameters of the current raise. Read-only to the core.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaiseConfig {
    /// Smallest currency unit.
    pub minimum_investment: u64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<u64>,
    /// Instrument label shown next to the form (e.g. "SAFE").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instrument: Option<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl RaiseConfig {
    pub fn with_minimum(minimum_investment: u64) -> Self {
        Self {
            minimum_investment,
            currency: default_currency(),
            target: None,
            instrument: None,
        }
    }

    pub fn meets_minimum(&self, amount: u64) -> bool {
        amount >= self.minimum_investment
    }
}
