use serde::{Deserialize, Serialize};

use crate::ids::DocumentId;

/// Access tier of a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum DocumentTier {
    /// Tier 1: open to every visitor.
    Open,
    /// Tier 2: requires identity verification and a current disclaimer acceptance.
    Gated,
}

impl DocumentTier {
    pub fn number(self) -> u8 {
        match self {
            DocumentTier::Open => 1,
            DocumentTier::Gated => 2,
        }
    }
}

impl TryFrom<u8> for DocumentTier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(DocumentTier::Open),
            2 => Ok(DocumentTier::Gated),
            other => Err(format!("unknown document tier: {}", other)),
        }
    }
}

impl From<DocumentTier> for u8 {
    fn from(tier: DocumentTier) -> Self {
        tier.number()
    }
}

/// Grouping label used by the document list (e.g. "financials", "legal").
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentCategory(pub String);

impl DocumentCategory {
    pub fn new(category: impl Into<String>) -> Self {
        Self(category.into())
    }
}

impl std::fmt::Display for DocumentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a document lives.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LocationRef {
    /// Directly retrievable URL.
    Direct { url: String },
    /// Opaque storage key; must be exchanged for a time-limited URL.
    Storage { key: String },
}

impl LocationRef {
    pub fn direct(url: impl Into<String>) -> Self {
        LocationRef::Direct { url: url.into() }
    }

    pub fn storage(key: impl Into<String>) -> Self {
        LocationRef::Storage { key: key.into() }
    }

    /// True when retrieval needs a resolver round trip.
    pub fn needs_resolution(&self) -> bool {
        matches!(self, LocationRef::Storage { .. })
    }
}

/// A piece of investor-facing material. Immutable from the core's view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tier: DocumentTier,
    pub category: DocumentCategory,
    pub location: LocationRef,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        tier: DocumentTier,
        category: impl Into<String>,
        location: LocationRef,
    ) -> Self {
        Self {
            id: DocumentId::new(id),
            title: title.into(),
            description: None,
            tier,
            category: DocumentCategory::new(category),
            location,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn is_gated(&self) -> bool {
        self.tier == DocumentTier::Gated
    }
}
