use serde::{Deserialize, Serialize};

use crate::ids::DisclaimerVersion;

/// A single acknowledgment line in a disclaimer definition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclaimerItem {
    pub id: String,
    pub label: String,
    pub text: String,
    #[serde(default = "default_required")]
    pub required: bool,
}

fn default_required() -> bool {
    true
}

/// Versioned set of risk acknowledgments.
///
/// An acceptance only satisfies the version it was given against; a newer
/// definition requires a new acceptance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisclaimerDefinition {
    pub version: DisclaimerVersion,
    pub items: Vec<DisclaimerItem>,
}

impl DisclaimerDefinition {
    pub fn new(version: impl Into<String>, items: Vec<DisclaimerItem>) -> Self {
        Self {
            version: DisclaimerVersion::new(version),
            items,
        }
    }

    /// Items the investor must check before acceptance.
    pub fn required_items(&self) -> impl Iterator<Item = &DisclaimerItem> {
        self.items.iter().filter(|item| item.required)
    }

    /// Required item ids absent from `checked`, in definition order.
    pub fn missing_required<'a, S: AsRef<str>>(&'a self, checked: &[S]) -> Vec<&'a str> {
        self.required_items()
            .filter(|item| !checked.iter().any(|c| c.as_ref() == item.id))
            .map(|item| item.id.as_str())
            .collect()
    }
}

impl DisclaimerItem {
    pub fn required(id: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            text: text.into(),
            required: true,
        }
    }

    pub fn optional(id: impl Into<String>, label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            required: false,
            ..Self::required(id, label, text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> DisclaimerDefinition {
        DisclaimerDefinition::new(
            "v1",
            vec![
                DisclaimerItem::required("illiquid", "Illiquidity", "Shares may never be sold."),
                DisclaimerItem::required("loss", "Total loss", "You may lose everything."),
                DisclaimerItem::optional("updates", "Updates", "Send me investor updates."),
            ],
        )
    }

    #[test]
    fn missing_required_lists_unchecked_items() {
        let def = definition();
        assert_eq!(def.missing_required(&["illiquid"]), vec!["loss"]);
        assert!(def.missing_required(&["illiquid", "loss"]).is_empty());
    }

    #[test]
    fn optional_items_never_missing() {
        let def = definition();
        let missing = def.missing_required::<&str>(&[]);
        assert!(!missing.contains(&"updates"));
        assert_eq!(missing.len(), 2);
    }

    #[test]
    fn required_defaults_to_true_on_the_wire() {
        let item: DisclaimerItem =
            serde_json::from_str(r#"{"id":"a","label":"A","text":"t"}"#).unwrap();
        assert!(item.required);
    }
}
