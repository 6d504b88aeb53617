//! Inbox notification records and last-seen tracking

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a Directus notification
///
/// Directus serializes integer primary keys as JSON numbers; both numbers
/// and strings are accepted and compared by their text form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct NotificationId(String);

impl NotificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NotificationId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for NotificationId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(s) => Self(s),
            RawId::Number(n) => Self(n.to_string()),
        })
    }
}

/// Top-of-feed notification as returned by the inbox query
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InboxItem {
    pub id: NotificationId,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    /// Primary key of the related item; its type depends on the collection
    #[serde(default)]
    pub item: Option<serde_json::Value>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl InboxItem {
    /// Create an item with just an id and subject
    pub fn new(id: impl Into<String>, subject: impl Into<String>) -> Self {
        Self {
            id: NotificationId::new(id),
            subject: Some(subject.into()),
            collection: None,
            item: None,
            timestamp: None,
        }
    }
}

/// Id of the most recently surfaced top-of-feed item
///
/// Lives for the process lifetime only; a restart begins with nothing seen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LastSeen(Option<NotificationId>);

impl LastSeen {
    pub fn get(&self) -> Option<&NotificationId> {
        self.0.as_ref()
    }

    /// Record `id` as the newest item. Returns false if it was already current.
    pub fn advance(&mut self, id: &NotificationId) -> bool {
        if self.0.as_ref() == Some(id) {
            return false;
        }
        self.0 = Some(id.clone());
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_accepts_numbers_and_strings() {
        let numeric: NotificationId = serde_json::from_str("42").unwrap();
        let text: NotificationId = serde_json::from_str("\"42\"").unwrap();
        assert_eq!(numeric, text);
        assert_eq!(numeric.as_str(), "42");
    }

    #[test]
    fn test_item_tolerates_missing_fields() {
        let item: InboxItem = serde_json::from_str(r#"{"id": 7}"#).unwrap();
        assert_eq!(item.id, NotificationId::new("7"));
        assert!(item.subject.is_none());
    }

    #[test]
    fn test_last_seen_advances_only_on_change() {
        let mut last_seen = LastSeen::default();
        assert!(last_seen.get().is_none());

        assert!(last_seen.advance(&NotificationId::new("4")));
        assert!(!last_seen.advance(&NotificationId::new("4")));
        assert!(last_seen.advance(&NotificationId::new("5")));
        assert_eq!(last_seen.get(), Some(&NotificationId::new("5")));
    }
}
