//! End-to-end intent flows against the mock backend.

use investor_intent::{IntentRequest, IntentStep, IntentWorkflow, MockIntentBackend};
use investor_types::{
    ErrorKind, IntentStatus, PaymentMethod, PortalError, RaiseConfig, SigningMethod,
};

fn raise() -> RaiseConfig {
    RaiseConfig::with_minimum(1000)
}

fn wire(amount: u64) -> IntentRequest {
    IntentRequest::new(amount, PaymentMethod::Wire)
        .accredited(true)
        .risk_acknowledged(true)
}

#[tokio::test]
async fn in_app_consent_round_trip_reaches_signed() {
    let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
    let mut workflow = IntentWorkflow::new();

    let intent = workflow
        .submit(&backend, &wire(5000), Some(&raise()))
        .await
        .unwrap();
    assert_eq!(intent.status, IntentStatus::ConsentPending);
    assert_eq!(intent.amount, 5000);
    assert_eq!(intent.payment_method, PaymentMethod::Wire);
    let consent_id = intent.consent_id.clone().unwrap();

    assert_eq!(
        workflow.step(),
        IntentStep::ConsentForm {
            consent_id: consent_id.clone()
        }
    );

    let signed = workflow.sign_consent(&backend, "  Jane Q. Investor ").await.unwrap();
    assert_eq!(signed.status, IntentStatus::Signed);
    assert!(signed.signed_at.is_some());
    assert_eq!(signed.consent_id.as_ref(), Some(&consent_id));
    assert_eq!(workflow.step(), IntentStep::Complete);
}

#[tokio::test]
async fn duplicate_submit_leaves_first_intent_untouched() {
    let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
    let mut workflow = IntentWorkflow::new();

    let first = workflow
        .submit(&backend, &wire(5000), Some(&raise()))
        .await
        .unwrap()
        .clone();

    let err = workflow
        .submit(
            &backend,
            &IntentRequest::new(9000, PaymentMethod::Check).risk_acknowledged(true),
            Some(&raise()),
        )
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PortalError::IntentAlreadyExists {
            status: IntentStatus::SafeSent
        }
    );
    assert_eq!(workflow.intent(), Some(&first));
    assert_eq!(backend.stored(), Some(first));
    assert_eq!(backend.submit_calls(), 1);
}

#[tokio::test]
async fn stale_client_cannot_overwrite_existing_intent() {
    let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
    let mut first_tab = IntentWorkflow::new();
    first_tab
        .submit(&backend, &wire(5000), Some(&raise()))
        .await
        .unwrap();

    // A second view that never saw the first submission.
    let mut second_tab = IntentWorkflow::new();
    let err = second_tab
        .submit(&backend, &wire(7000), Some(&raise()))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IntentAlreadyExists);
    assert_eq!(second_tab.status(), IntentStatus::None);

    assert_eq!(second_tab.refresh(&backend).await.unwrap(), IntentStatus::SafeSent);
    assert_eq!(backend.stored().map(|i| i.amount), Some(5000));
}

#[tokio::test]
async fn below_minimum_stays_at_none() {
    let backend = MockIntentBackend::new(SigningMethod::InAppConsent);
    let mut workflow = IntentWorkflow::new();

    let err = workflow
        .submit(&backend, &wire(500), Some(&raise()))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        PortalError::BelowMinimum {
            amount: 500,
            minimum: 1000
        }
    );
    assert!(err.is_validation());
    assert_eq!(workflow.status(), IntentStatus::None);
    assert_eq!(workflow.step(), IntentStep::Form);
    assert_eq!(backend.submit_calls(), 0);
}

#[tokio::test]
async fn external_signature_only_observed_by_refresh() {
    let backend = MockIntentBackend::new(SigningMethod::ExternalESign);
    let mut workflow = IntentWorkflow::new();
    workflow
        .submit(&backend, &wire(2500), Some(&raise()))
        .await
        .unwrap();

    backend.complete_external_signature();
    // Nothing local changes until the next read.
    assert_eq!(workflow.status(), IntentStatus::SafeSent);

    assert_eq!(workflow.refresh(&backend).await.unwrap(), IntentStatus::Signed);
    assert_eq!(workflow.step(), IntentStep::Complete);
}
