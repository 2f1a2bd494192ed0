//! Ordered key-value metadata attached to commerce entities.
//!
//! The commerce API exposes a generic metadata list on checkouts, addresses
//! and orders. Bramble reuses it to carry fields the remote schema has no
//! native column for; every such key is named in [`keys`] so the convention
//! has exactly one point of change.

use serde::{Deserialize, Serialize};

/// Well-known metadata keys.
pub mod keys {
    /// Street number of an address (the remote address type only has a
    /// free-form street line).
    pub const STREET_NUMBER: &str = "streetNumber";
    /// Country subdivision fallback written alongside the native field.
    pub const COUNTRY_AREA: &str = "countryArea";
    /// Buyer name collected in the contact section.
    pub const NAME: &str = "name";
    /// Serialized checkout snapshot stored on the completed order.
    pub const CHECKOUT_DATA: &str = "checkoutData";
}

/// A single metadata entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    /// Entry key.
    pub key: String,
    /// Entry value.
    pub value: String,
}

impl MetadataItem {
    /// Create a new entry.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// An ordered metadata list.
///
/// Entry order is preserved as returned by the remote API; lookups scan in
/// order, so the first entry for a key wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Vec<MetadataItem>);

impl Metadata {
    /// An empty metadata list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Value for `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|item| item.key == key)
            .map(|item| item.value.as_str())
    }

    /// Insert or replace the entry for `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        if let Some(item) = self.0.iter_mut().find(|item| item.key == key) {
            item.value = value;
        } else {
            self.0.push(MetadataItem { key, value });
        }
    }

    /// Iterate over entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &MetadataItem> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<MetadataItem>> for Metadata {
    fn from(items: Vec<MetadataItem>) -> Self {
        Self(items)
    }
}

impl FromIterator<MetadataItem> for Metadata {
    fn from_iter<T: IntoIterator<Item = MetadataItem>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_first_entry_wins() {
        let metadata = Metadata::from(vec![
            MetadataItem::new("streetNumber", "12"),
            MetadataItem::new("streetNumber", "99"),
        ]);
        assert_eq!(metadata.get("streetNumber"), Some("12"));
    }

    #[test]
    fn test_get_missing_key() {
        let metadata = Metadata::new();
        assert_eq!(metadata.get("name"), None);
    }

    #[test]
    fn test_set_replaces_in_place() {
        let mut metadata = Metadata::from(vec![
            MetadataItem::new("name", "Ada"),
            MetadataItem::new("countryArea", "CA"),
        ]);
        metadata.set("name", "Grace");

        assert_eq!(metadata.get("name"), Some("Grace"));
        assert_eq!(metadata.len(), 2);
        // Order preserved
        let keys: Vec<&str> = metadata.iter().map(|item| item.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "countryArea"]);
    }

    #[test]
    fn test_serde_transparent_list() {
        let metadata = Metadata::from(vec![MetadataItem::new("streetNumber", "7")]);
        let json = serde_json::to_string(&metadata).expect("serialize");
        assert_eq!(json, r#"[{"key":"streetNumber","value":"7"}]"#);

        let back: Metadata = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, metadata);
    }
}
