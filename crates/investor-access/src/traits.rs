use async_trait::async_trait;
use chrono::{DateTime, Utc};
use investor_types::{DisclaimerVersion, PortalResult};
use serde::{Deserialize, Serialize};

/// Short-lived retrieval URL minted by the document store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedUrl {
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl ResolvedUrl {
    /// A URL that needs no exchange and never expires.
    pub fn permanent(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            expires_at: None,
        }
    }
}

/// Exchanges opaque storage keys for retrieval URLs.
///
/// Repeated calls may mint different URLs.
#[async_trait]
pub trait DocumentResolver: Send + Sync {
    async fn resolve_location(&self, storage_key: &str) -> PortalResult<ResolvedUrl>;
}

/// Records a disclaimer acceptance with the backend.
#[async_trait]
pub trait DisclaimerAcceptor: Send + Sync {
    async fn accept_disclaimer(
        &self,
        version: &DisclaimerVersion,
        checked_item_ids: &[String],
    ) -> PortalResult<()>;
}
