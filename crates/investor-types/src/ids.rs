use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

string_id!(
    /// Stable identifier of an investor, issued by the authentication backend.
    InvestorId
);

string_id!(
    /// Identifier of a piece of investor-facing material.
    DocumentId
);

string_id!(
    /// Identifier of an in-app consent record awaiting a typed signature.
    ConsentId
);

string_id!(
    /// Identifier of an investment intent record.
    IntentId
);

string_id!(
    /// Version tag of a disclaimer definition (e.g. "v1", "2024-03").
    DisclaimerVersion
);

impl IntentId {
    /// Mint a fresh random intent id.
    pub fn generate() -> Self {
        Self(format!("intent-{}", uuid::Uuid::new_v4()))
    }
}

impl ConsentId {
    /// Mint a fresh random consent id.
    pub fn generate() -> Self {
        Self(format!("consent-{}", uuid::Uuid::new_v4()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_serialize_as_bare_strings() {
        let id = DocumentId::new("deck-2024");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"deck-2024\"");
        assert_eq!(id.to_string(), "deck-2024");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(IntentId::generate(), IntentId::generate());
        assert!(ConsentId::generate().as_str().starts_with("consent-"));
    }
}
