use serde::{Deserialize, Serialize};

use crate::ids::DisclaimerVersion;

/// A gate the investor still has to pass, in remediation priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MissingGate {
    /// Identity verification; always prompted first.
    Identity,
    /// Acknowledgment of the current disclaimer version.
    Disclaimer,
}

impl MissingGate {
    /// Remediation prompt naming the specific gate.
    pub fn prompt(self) -> &'static str {
        match self {
            MissingGate::Identity => "Verify your identity to unlock this document.",
            MissingGate::Disclaimer => {
                "Review and accept the current risk disclosures to unlock this document."
            }
        }
    }
}

impl std::fmt::Display for MissingGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MissingGate::Identity => f.write_str("IDENTITY"),
            MissingGate::Disclaimer => f.write_str("DISCLAIMER"),
        }
    }
}

/// Per-investor access state.
///
/// Mutated only after the identity verification adapter or the disclaimer
/// tracker report a confirmed backend response. Booleans move false -> true
/// only; an operator-initiated reset happens outside this workspace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gates {
    pub identity_verified: bool,
    pub disclaimer_accepted: bool,
    /// Version the investor actually acknowledged. Never backfilled.
    pub disclaimer_version: Option<DisclaimerVersion>,
}

impl Gates {
    /// Gates as created on first portal visit.
    pub fn empty() -> Self {
        Self::default()
    }

    /// `disclaimer_accepted` implies a recorded version.
    pub fn is_consistent(&self) -> bool {
        !self.disclaimer_accepted || self.disclaimer_version.is_some()
    }

    /// Accepted against exactly `version`.
    pub fn accepted_version(&self, version: &DisclaimerVersion) -> bool {
        self.disclaimer_accepted && self.disclaimer_version.as_ref() == Some(version)
    }

    /// Record a confirmed identity verification.
    pub fn mark_identity_verified(&mut self) {
        self.identity_verified = true;
    }

    /// Record a confirmed disclaimer acceptance against `version`.
    pub fn mark_disclaimer_accepted(&mut self, version: DisclaimerVersion) {
        self.disclaimer_accepted = true;
        self.disclaimer_version = Some(version);
    }

    /// Merge an authoritative backend read into locally known state.
    ///
    /// The backend wins on every field. Returns true when the local view
    /// changed.
    pub fn supersede_with(&mut self, authoritative: Gates) -> bool {
        let changed = *self != authoritative;
        *self = authoritative;
        changed
    }
}
