//! HttpBackend against a mock REST server.

use std::time::Duration;

use investor_access::{AccessOutcome, DisclaimerAcceptor, DocumentAccessController, SessionContext};
use investor_intent::{IntentBackend, SubmitIntentPayload};
use investor_providers::{HttpBackend, IdentityVerificationAdapter, PortalReader};
use investor_types::{
    DisclaimerDefinition, DisclaimerVersion, Document, DocumentTier, ErrorKind, Gates, IntentStatus, LocationRef,
    PaymentMethod,
};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend(server: &MockServer) -> HttpBackend {
    HttpBackend::new(&server.uri(), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn missing_intent_reads_as_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/investor/intent"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let intent = backend(&server).fetch_intent().await.unwrap();
    assert!(intent.is_none());
}

#[tokio::test]
async fn reads_gates_with_bearer_token() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/investor/gates"))
        .and(header("authorization", "Bearer session-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "identity_verified": true,
            "disclaimer_accepted": true,
            "disclaimer_version": "v2"
        })))
        .mount(&server)
        .await;

    let gates = backend(&server)
        .with_token("session-123")
        .fetch_gates()
        .await
        .unwrap();
    assert!(gates.identity_verified);
    assert!(gates.accepted_version(&DisclaimerVersion::new("v2")));
}

#[tokio::test]
async fn submit_rejection_maps_to_typed_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/intent"))
        .and(body_json(json!({
            "amount": 500,
            "payment_method": "wire",
            "accredited_confirmed": false
        })))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "kind": "BELOW_MINIMUM",
            "message": "amount below minimum",
            "amount": 500,
            "minimum": 1000
        })))
        .mount(&server)
        .await;

    let err = backend(&server)
        .submit_intent(&SubmitIntentPayload {
            amount: 500,
            payment_method: PaymentMethod::Wire,
            accredited_confirmed: false,
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BelowMinimum);
    assert!(err.is_validation());
}

#[tokio::test]
async fn submit_returns_backend_record() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/intent"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "intent-1",
            "investor_id": "investor-1",
            "amount": 5000,
            "payment_method": "wire",
            "accredited_confirmed": true,
            "status": "CONSENT_PENDING",
            "signing_method": "in-app-consent",
            "consent_id": "consent-1",
            "created_at": "2024-05-01T12:00:00Z",
            "updated_at": "2024-05-01T12:00:00Z"
        })))
        .mount(&server)
        .await;

    let intent = backend(&server)
        .submit_intent(&SubmitIntentPayload {
            amount: 5000,
            payment_method: PaymentMethod::Wire,
            accredited_confirmed: true,
        })
        .await
        .unwrap();
    assert_eq!(intent.status, IntentStatus::ConsentPending);
    assert_eq!(intent.consent_id.as_ref().map(|c| c.as_str()), Some("consent-1"));
    assert!(intent.is_consistent());
}

#[tokio::test]
async fn server_error_is_retryable_network_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/disclaimer/accept"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let err = backend(&server)
        .accept_disclaimer(&DisclaimerVersion::new("v1"), &["risk".to_string()])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NetworkFailure);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn resolver_retries_once_then_surfaces_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/documents/resolve"))
        .respond_with(ResponseTemplate::new(500))
        .expect(2)
        .mount(&server)
        .await;

    let document = Document::new(
        "financials",
        "Financials",
        DocumentTier::Gated,
        "Financials",
        LocationRef::storage("gated/financials.pdf"),
    );
    let mut gates = Gates::empty();
    gates.mark_identity_verified();
    gates.mark_disclaimer_accepted(DisclaimerVersion::new("v1"));
    let ctx = SessionContext::new(
        gates.clone(),
        Some(DisclaimerDefinition::new("v1", vec![])),
    );

    let outcome = DocumentAccessController::new().resolve(&document, &ctx);
    let call = match outcome {
        AccessOutcome::Resolvable(call) => call,
        other => panic!("expected resolvable, got {:?}", other),
    };

    let http = backend(&server);
    let err = call.execute(&http).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ResolverFailure);
    // Gate state is untouched by a resolver failure.
    assert_eq!(ctx.gates, gates);
}

#[tokio::test]
async fn verification_start_and_negative_confirm() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/verification/start"))
        .and(body_json(json!({
            "return_url": "https://portal.test/investors?verification_return=1"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "url": "https://verify.test/checkout/abc"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/investor/verification/confirm"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "verified": false,
            "reason": "document check failed"
        })))
        .mount(&server)
        .await;

    let http = backend(&server);
    let adapter = IdentityVerificationAdapter::default();
    let portal = Url::parse("https://portal.test/investors").unwrap();

    let target = adapter.start(&http, &portal).await.unwrap();
    assert_eq!(target.url.host_str(), Some("verify.test"));

    let mut gates = Gates::empty();
    let err = adapter.confirm(&http, &mut gates).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::VerificationNotConfirmed);
    assert!(err.to_string().contains("document check failed"));
    assert!(!gates.identity_verified);
}
