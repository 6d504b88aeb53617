//! Inbox watcher: newest-item detection and trigger filtering

use anyhow::Result;
use log::debug;
use std::sync::Arc;

use crate::directus::{DirectusApi, InboxQuery};
use crate::models::{InboxItem, LastSeen, NotificationId, RecipientId};

/// Subject Directus uses for "a new walk-in user was created"
pub const WALKIN_SUBJECT: &str = "You_have_new_walkin_user";

/// What a fetched top-of-feed item means for the last-seen state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The inbox has no items
    Empty,
    /// The top item is the one already seen
    Unchanged(NotificationId),
    /// A different item is on top; `notify` is set when it matches the trigger
    Advanced { id: NotificationId, notify: bool },
}

/// Queries the inbox feed and de-duplicates against the last-seen item
pub struct InboxWatcher {
    api: Arc<dyn DirectusApi>,
    trigger_subject: String,
}

impl InboxWatcher {
    pub fn new(api: Arc<dyn DirectusApi>, trigger_subject: impl Into<String>) -> Self {
        Self {
            api,
            trigger_subject: trigger_subject.into(),
        }
    }

    /// Fetch the newest inbox item addressed to `recipient`
    pub fn fetch_latest(
        &self,
        access_token: &str,
        recipient: &RecipientId,
    ) -> Result<Option<InboxItem>> {
        let query = InboxQuery::latest_for(recipient.clone());
        let latest = self.api.latest_notification(access_token, &query)?;
        debug!(
            "Inbox top item for {}: {:?}",
            recipient,
            latest.as_ref().map(|item| item.id.as_str())
        );
        Ok(latest)
    }

    /// Exact match against the trigger subject
    pub fn matches_trigger(&self, item: &InboxItem) -> bool {
        item.subject.as_deref() == Some(self.trigger_subject.as_str())
    }

    /// Apply a fetched top item to `last_seen`
    ///
    /// Advances `last_seen` whenever the top id differs, whether or not the
    /// subject matches; an unchanged id or an empty feed leaves it untouched.
    pub fn observe(&self, last_seen: &mut LastSeen, latest: Option<&InboxItem>) -> Observation {
        let Some(item) = latest else {
            return Observation::Empty;
        };

        if !last_seen.advance(&item.id) {
            return Observation::Unchanged(item.id.clone());
        }

        Observation::Advanced {
            id: item.id.clone(),
            notify: self.matches_trigger(item),
        }
    }
}
