use investor_types::{ConsentId, IntentStatus, InvestmentIntent, SigningMethod};
use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Something that happened to an intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntentEvent {
    /// Backend accepted a submission and chose a signing method.
    Submitted(SigningMethod),
    /// Backend confirmed the typed-name consent.
    ConsentSigned,
    /// A re-read reported the external signature as complete.
    SignatureObserved,
    /// The external signing link was sent again.
    SigningLinkResent,
}

impl IntentEvent {
    /// Operation name used in user-facing errors.
    pub fn operation(self) -> &'static str {
        match self {
            IntentEvent::Submitted(_) => "submit intent",
            IntentEvent::ConsentSigned => "sign consent",
            IntentEvent::SignatureObserved => "observe signature",
            IntentEvent::SigningLinkResent => "resend signing link",
        }
    }
}

/// Pure transition table.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntentStateMachine;

impl IntentStateMachine {
    pub fn new() -> Self {
        Self
    }

    pub fn transition(
        &self,
        from: IntentStatus,
        event: IntentEvent,
    ) -> Result<IntentStatus, TransitionError> {
        use IntentStatus::*;

        match (from, event) {
            (None, IntentEvent::Submitted(method)) => Ok(IntentStatus::after_submission(method)),
            (status, IntentEvent::Submitted(_)) => Err(TransitionError::AlreadyExists(status)),

            (SafeSent, IntentEvent::SignatureObserved) => Ok(Signed),
            (SafeSent, IntentEvent::SigningLinkResent) => Ok(SafeSent),
            (ConsentPending, IntentEvent::ConsentSigned) => Ok(Signed),

            (from, event) => Err(TransitionError::Invalid { from, event }),
        }
    }

    /// Guard a submission without computing the target state.
    pub fn can_submit(&self, from: IntentStatus) -> Result<(), TransitionError> {
        match from {
            IntentStatus::None => Ok(()),
            status => Err(TransitionError::AlreadyExists(status)),
        }
    }
}

/// Which screen the investment flow should render.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum IntentStep {
    /// No intent yet: offer the submission form.
    Form,
    /// Instrument sent to the external provider; offer resend and refresh.
    AwaitingExternalSignature,
    /// Collect the typed legal name for this consent.
    ConsentForm { consent_id: ConsentId },
    /// Signed; nothing left to do.
    Complete,
}

impl IntentStep {
    pub fn for_intent(intent: Option<&InvestmentIntent>) -> Self {
        let Some(intent) = intent else {
            return IntentStep::Form;
        };

        match intent.status {
            IntentStatus::None => IntentStep::Form,
            IntentStatus::SafeSent => IntentStep::AwaitingExternalSignature,
            IntentStatus::ConsentPending => match &intent.consent_id {
                Some(consent_id) => IntentStep::ConsentForm {
                    consent_id: consent_id.clone(),
                },
                // No consent to sign against; re-read before offering anything.
                None => IntentStep::AwaitingExternalSignature,
            },
            IntentStatus::Signed => IntentStep::Complete,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submission_only_from_none() {
        let machine = IntentStateMachine::new();
        assert_eq!(
            machine.transition(IntentStatus::None, IntentEvent::Submitted(SigningMethod::ExternalESign)),
            Ok(IntentStatus::SafeSent)
        );
        assert_eq!(
            machine.transition(IntentStatus::None, IntentEvent::Submitted(SigningMethod::InAppConsent)),
            Ok(IntentStatus::ConsentPending)
        );

        for status in [IntentStatus::SafeSent, IntentStatus::ConsentPending, IntentStatus::Signed] {
            assert_eq!(
                machine.transition(status, IntentEvent::Submitted(SigningMethod::InAppConsent)),
                Err(TransitionError::AlreadyExists(status))
            );
        }
    }

    #[test]
    fn consent_signs_only_from_consent_pending() {
        let machine = IntentStateMachine::new();
        assert_eq!(
            machine.transition(IntentStatus::ConsentPending, IntentEvent::ConsentSigned),
            Ok(IntentStatus::Signed)
        );
        assert!(machine
            .transition(IntentStatus::SafeSent, IntentEvent::ConsentSigned)
            .is_err());
        assert!(machine
            .transition(IntentStatus::Signed, IntentEvent::ConsentSigned)
            .is_err());
    }

    #[test]
    fn external_signature_observed_from_safe_sent() {
        let machine = IntentStateMachine::new();
        assert_eq!(
            machine.transition(IntentStatus::SafeSent, IntentEvent::SignatureObserved),
            Ok(IntentStatus::Signed)
        );
        assert!(machine
            .transition(IntentStatus::ConsentPending, IntentEvent::SignatureObserved)
            .is_err());
    }

    #[test]
    fn resend_keeps_safe_sent() {
        let machine = IntentStateMachine::new();
        assert_eq!(
            machine.transition(IntentStatus::SafeSent, IntentEvent::SigningLinkResent),
            Ok(IntentStatus::SafeSent)
        );
        assert!(machine
            .transition(IntentStatus::None, IntentEvent::SigningLinkResent)
            .is_err());
    }

    #[test]
    fn signed_is_terminal() {
        let machine = IntentStateMachine::new();
        for event in [
            IntentEvent::ConsentSigned,
            IntentEvent::SignatureObserved,
            IntentEvent::SigningLinkResent,
        ] {
            assert!(machine.transition(IntentStatus::Signed, event).is_err());
        }
    }

    #[test]
    fn step_without_intent_is_form() {
        assert_eq!(IntentStep::for_intent(None), IntentStep::Form);
    }
}
