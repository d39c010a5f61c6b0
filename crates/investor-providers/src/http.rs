//! HTTP backend client.
//!
//! Maps every collaborator operation onto a JSON REST call under
//! `/api/v1/investor/`.

use std::time::Duration;

use async_trait::async_trait;
use investor_access::{DisclaimerAcceptor, DocumentResolver, ResolvedUrl};
use investor_intent::{IntentBackend, SubmitIntentPayload};
use investor_types::{
    ConsentId, DisclaimerDefinition, DisclaimerVersion, Document, Gates, InvestmentIntent,
    Investor, PortalResult, RaiseConfig,
};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::error::{ApiErrorBody, BackendError, BackendResult};
use crate::traits::{
    OperatorConfirmation, PortalReader, RedirectTarget, VerificationBackend, VerificationOutcome,
};

const API_PREFIX: &str = "/api/v1/investor";

#[derive(Debug, Serialize)]
struct ResolveRequest<'a> {
    storage_key: &'a str,
}

#[derive(Debug, Serialize)]
struct StartVerificationRequest<'a> {
    return_url: &'a str,
}

#[derive(Debug, Serialize)]
struct AcceptDisclaimerRequest<'a> {
    version: &'a DisclaimerVersion,
    checked_item_ids: &'a [String],
}

#[derive(Debug, Serialize)]
struct SignConsentRequest<'a> {
    consent_id: &'a ConsentId,
    typed_legal_name: &'a str,
}

#[derive(Debug, Deserialize, Serialize)]
struct Empty {}

/// HTTP client for the investor backend
#[derive(Clone, Debug)]
pub struct HttpBackend {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a new client against `endpoint`
    pub fn new(endpoint: &str, timeout: Duration) -> BackendResult<Self> {
        // Reject garbage early rather than on the first request.
        Url::parse(endpoint)?;

        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: endpoint.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Authenticate every request with a bearer session token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> BackendResult<T> {
        debug!(method = "GET", path, "Backend request");
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        Self::handle_response(response).await
    }

    /// GET where 404 means "nothing there".
    async fn get_optional<T: DeserializeOwned>(&self, path: &str) -> BackendResult<Option<T>> {
        debug!(method = "GET", path, "Backend request");
        let response = self.authorize(self.client.get(self.url(path))).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::handle_response(response).await.map(Some)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> BackendResult<T> {
        debug!(method = "POST", path, "Backend request");
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// POST whose success response carries no body of interest.
    async fn post_no_content<B: Serialize>(&self, path: &str, body: &B) -> BackendResult<()> {
        debug!(method = "POST", path, "Backend request");
        let response = self
            .authorize(self.client.post(self.url(path)))
            .json(body)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::error_from(status, response.text().await.unwrap_or_default()))
        }
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> BackendResult<T> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            Ok(serde_json::from_str(&text)?)
        } else {
            Err(Self::error_from(status, text))
        }
    }

    fn error_from(status: StatusCode, text: String) -> BackendError {
        match serde_json::from_str::<ApiErrorBody>(&text) {
            Ok(body) if body.kind.is_some() => BackendError::Rejected(body),
            _ => BackendError::Status {
                status: status.as_u16(),
                message: text,
            },
        }
    }
}

#[async_trait]
impl PortalReader for HttpBackend {
    async fn fetch_investor(&self) -> PortalResult<Investor> {
        Ok(self.get("/me").await?)
    }

    async fn fetch_documents(&self) -> PortalResult<Vec<Document>> {
        Ok(self.get("/documents").await?)
    }

    async fn fetch_gates(&self) -> PortalResult<Gates> {
        Ok(self.get("/gates").await?)
    }

    async fn fetch_disclaimer(&self) -> PortalResult<DisclaimerDefinition> {
        Ok(self.get("/disclaimer").await?)
    }

    async fn fetch_raise_config(&self) -> PortalResult<RaiseConfig> {
        Ok(self.get("/raise").await?)
    }
}

#[async_trait]
impl DocumentResolver for HttpBackend {
    async fn resolve_location(&self, storage_key: &str) -> PortalResult<ResolvedUrl> {
        Ok(self
            .post("/documents/resolve", &ResolveRequest { storage_key })
            .await?)
    }
}

#[async_trait]
impl DisclaimerAcceptor for HttpBackend {
    async fn accept_disclaimer(
        &self,
        version: &DisclaimerVersion,
        checked_item_ids: &[String],
    ) -> PortalResult<()> {
        let body = AcceptDisclaimerRequest {
            version,
            checked_item_ids,
        };
        Ok(self.post_no_content("/disclaimer/accept", &body).await?)
    }
}

#[async_trait]
impl VerificationBackend for HttpBackend {
    async fn start_verification(&self, return_url: &Url) -> PortalResult<RedirectTarget> {
        let body = StartVerificationRequest {
            return_url: return_url.as_str(),
        };
        Ok(self.post("/verification/start", &body).await?)
    }

    async fn confirm_verification(&self) -> PortalResult<VerificationOutcome> {
        Ok(self.post("/verification/confirm", &Empty {}).await?)
    }

    async fn override_verification(
        &self,
        confirmation: &OperatorConfirmation,
    ) -> PortalResult<Gates> {
        Ok(self.post("/verification/override", confirmation).await?)
    }
}

#[async_trait]
impl IntentBackend for HttpBackend {
    async fn fetch_intent(&self) -> PortalResult<Option<InvestmentIntent>> {
        Ok(self.get_optional("/intent").await?)
    }

    async fn submit_intent(&self, payload: &SubmitIntentPayload) -> PortalResult<InvestmentIntent> {
        Ok(self.post("/intent", payload).await?)
    }

    async fn sign_consent(
        &self,
        consent_id: &ConsentId,
        typed_legal_name: &str,
    ) -> PortalResult<InvestmentIntent> {
        let body = SignConsentRequest {
            consent_id,
            typed_legal_name,
        };
        Ok(self.post("/intent/consent", &body).await?)
    }

    async fn resend_signing_link(&self) -> PortalResult<()> {
        Ok(self.post_no_content("/intent/resend", &Empty {}).await?)
    }
}
