use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConsentId, IntentId, InvestorId};

/// How the investor intends to fund the investment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Wire,
    Ach,
    Check,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Wire => "wire",
            PaymentMethod::Ach => "ach",
            PaymentMethod::Check => "check",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wire" => Ok(PaymentMethod::Wire),
            "ach" => Ok(PaymentMethod::Ach),
            "check" => Ok(PaymentMethod::Check),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// Signing path chosen by the backend for a submission.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SigningMethod {
    /// Instrument sent to a third-party e-signature provider.
    ExternalESign,
    /// Typed-name consent captured inside the portal.
    InAppConsent,
}

/// Lifecycle status of an investment intent.
///
/// ```text
/// NONE --submit--> SAFE_SENT | CONSENT_PENDING
/// SAFE_SENT --(observed on re-read)--> SIGNED
/// CONSENT_PENDING --sign consent--> SIGNED
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntentStatus {
    #[default]
    None,
    SafeSent,
    ConsentPending,
    Signed,
}

impl IntentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntentStatus::None => "NONE",
            IntentStatus::SafeSent => "SAFE_SENT",
            IntentStatus::ConsentPending => "CONSENT_PENDING",
            IntentStatus::Signed => "SIGNED",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, IntentStatus::Signed)
    }

    /// An intent exists (pending or signed).
    pub fn exists(self) -> bool {
        !matches!(self, IntentStatus::None)
    }

    /// Status the backend moves a fresh submission into.
    pub fn after_submission(method: SigningMethod) -> Self {
        match method {
            SigningMethod::ExternalESign => IntentStatus::SafeSent,
            SigningMethod::InAppConsent => IntentStatus::ConsentPending,
        }
    }
}

impl std::fmt::Display for IntentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One investor's declared intention to invest.
///
/// Created on first submission and mutated only by confirmed backend
/// transitions. Never deleted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestmentIntent {
    pub id: IntentId,
    pub investor_id: InvestorId,
    /// Smallest currency unit.
    pub amount: u64,
    pub payment_method: PaymentMethod,
    pub accredited_confirmed: bool,
    pub status: IntentStatus,
    pub signing_method: SigningMethod,
    /// Present only for `SigningMethod::InAppConsent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_id: Option<ConsentId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_at: Option<DateTime<Utc>>,
}

impl InvestmentIntent {
    /// Consent id presence matches the signing method.
    pub fn is_consistent(&self) -> bool {
        match self.signing_method {
            SigningMethod::InAppConsent => self.consent_id.is_some(),
            SigningMethod::ExternalESign => self.consent_id.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_match_backend_contract() {
        assert_eq!(
            serde_json::to_string(&SigningMethod::ExternalESign).unwrap(),
            "\"external-e-sign\""
        );
        assert_eq!(
            serde_json::to_string(&SigningMethod::InAppConsent).unwrap(),
            "\"in-app-consent\""
        );
        assert_eq!(
            serde_json::to_string(&IntentStatus::ConsentPending).unwrap(),
            "\"CONSENT_PENDING\""
        );
        assert_eq!(serde_json::to_string(&PaymentMethod::Ach).unwrap(), "\"ach\"");
    }

    #[test]
    fn payment_method_parses_case_insensitively() {
        assert_eq!("WIRE".parse::<PaymentMethod>().unwrap(), PaymentMethod::Wire);
        assert!("crypto".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn submission_status_follows_signing_method() {
        assert_eq!(
            IntentStatus::after_submission(SigningMethod::ExternalESign),
            IntentStatus::SafeSent
        );
        assert_eq!(
            IntentStatus::after_submission(SigningMethod::InAppConsent),
            IntentStatus::ConsentPending
        );
    }

    #[test]
    fn only_signed_is_terminal() {
        assert!(IntentStatus::Signed.is_terminal());
        assert!(!IntentStatus::SafeSent.is_terminal());
        assert!(!IntentStatus::None.exists());
        assert!(IntentStatus::ConsentPending.exists());
    }
}
