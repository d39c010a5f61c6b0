use investor_types::{DisclaimerDefinition, Gates, MissingGate};
use serde::{Deserialize, Serialize};

/// Access level granted by the current gate state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessTier {
    /// Only open (tier 1) documents.
    #[serde(rename = "TIER1_ONLY")]
    Tier1Only,
    /// Open and gated documents.
    Full,
}

impl AccessTier {
    pub fn is_full(self) -> bool {
        matches!(self, AccessTier::Full)
    }
}

/// Gate Evaluator.
///
/// `Full` iff identity is verified, the disclaimer is accepted, and the
/// accepted version equals the current definition's version. With no
/// current definition the result is `Tier1Only`.
///
/// No I/O; safe to call on every render.
pub fn evaluate(gates: &Gates, current: Option<&DisclaimerDefinition>) -> AccessTier {
    match missing_gate(gates, current) {
        None => AccessTier::Full,
        Some(_) => AccessTier::Tier1Only,
    }
}

/// First gate still missing, in remediation order.
///
/// Identity is reported before the disclaimer. A stale acceptance or an
/// unavailable definition counts as a missing disclaimer.
pub fn missing_gate(gates: &Gates, current: Option<&DisclaimerDefinition>) -> Option<MissingGate> {
    if !gates.identity_verified {
        return Some(MissingGate::Identity);
    }

    match current {
        Some(definition) if gates.accepted_version(&definition.version) => None,
        _ => Some(MissingGate::Disclaimer),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use investor_types::{DisclaimerItem, DisclaimerVersion};

    fn definition(version: &str) -> DisclaimerDefinition {
        DisclaimerDefinition::new(
            version,
            vec![DisclaimerItem::required("risk", "Risk", "High risk.")],
        )
    }

    fn gates(identity: bool, accepted: Option<&str>) -> Gates {
        Gates {
            identity_verified: identity,
            disclaimer_accepted: accepted.is_some(),
            disclaimer_version: accepted.map(DisclaimerVersion::new),
        }
    }

    #[test]
    fn full_when_all_gates_pass() {
        let def = definition("v1");
        assert_eq!(evaluate(&gates(true, Some("v1")), Some(&def)), AccessTier::Full);
    }

    #[test]
    fn identity_missing_is_tier1() {
        let def = definition("v1");
        assert_eq!(evaluate(&gates(false, Some("v1")), Some(&def)), AccessTier::Tier1Only);
        assert_eq!(
            missing_gate(&gates(false, Some("v1")), Some(&def)),
            Some(MissingGate::Identity)
        );
    }

    #[test]
    fn version_mismatch_is_tier1() {
        let def = definition("v2");
        assert_eq!(evaluate(&gates(true, Some("v1")), Some(&def)), AccessTier::Tier1Only);
        assert_eq!(
            missing_gate(&gates(true, Some("v1")), Some(&def)),
            Some(MissingGate::Disclaimer)
        );
    }

    #[test]
    fn unavailable_definition_fails_closed() {
        assert_eq!(evaluate(&gates(true, Some("v1")), None), AccessTier::Tier1Only);
    }

    #[test]
    fn tier_serializes_with_wire_names() {
        assert_eq!(
            serde_json::to_string(&AccessTier::Tier1Only).unwrap(),
            "\"TIER1_ONLY\""
        );
        assert_eq!(serde_json::to_string(&AccessTier::Full).unwrap(), "\"FULL\"");
    }
}
