//! Test doubles shared by unit tests

use anyhow::{Result, anyhow};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::directus::api::TokenGrant;
use crate::directus::{DirectusApi, InboxQuery, TokenExpiredError};
use crate::models::{InboxItem, RecipientId};
use crate::notify::{Alert, Notifier};

/// Scripted DirectusApi
///
/// Defaults: refresh returns access token `a1` and rotated token `r2`,
/// identity returns `u1`, the inbox is empty.
pub struct MockDirectus {
    grant: Mutex<Result<TokenGrant, String>>,
    user: Mutex<Result<RecipientId, String>>,
    inbox: Mutex<VecDeque<Result<Option<InboxItem>, String>>>,
    last_refresh_token: Mutex<Option<String>>,
    last_query: Mutex<Option<InboxQuery>>,
    reject_next_token: AtomicBool,
    refresh_calls: AtomicUsize,
    user_calls: AtomicUsize,
    inbox_calls: AtomicUsize,
}

impl Default for MockDirectus {
    fn default() -> Self {
        Self {
            grant: Mutex::new(Ok(TokenGrant {
                access_token: Some("a1".into()),
                refresh_token: Some("r2".into()),
                expires: Some(900_000),
            })),
            user: Mutex::new(Ok(RecipientId::new("u1"))),
            inbox: Mutex::new(VecDeque::new()),
            last_refresh_token: Mutex::new(None),
            last_query: Mutex::new(None),
            reject_next_token: AtomicBool::new(false),
            refresh_calls: AtomicUsize::new(0),
            user_calls: AtomicUsize::new(0),
            inbox_calls: AtomicUsize::new(0),
        }
    }
}

impl MockDirectus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_grant(&self, grant: Result<TokenGrant, String>) {
        *self.grant.lock().unwrap() = grant;
    }

    pub fn set_user(&self, user: Result<RecipientId, String>) {
        *self.user.lock().unwrap() = user;
    }

    /// Queue one inbox response; once the queue drains the inbox reads as empty
    pub fn push_inbox(&self, response: Result<Option<InboxItem>, String>) {
        self.inbox.lock().unwrap().push_back(response);
    }

    /// Fail the next inbox query as if the access token had expired
    pub fn reject_next_token(&self) {
        self.reject_next_token.store(true, Ordering::SeqCst);
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn inbox_calls(&self) -> usize {
        self.inbox_calls.load(Ordering::SeqCst)
    }

    pub fn last_refresh_token(&self) -> Option<String> {
        self.last_refresh_token.lock().unwrap().clone()
    }

    pub fn last_query(&self) -> Option<InboxQuery> {
        self.last_query.lock().unwrap().clone()
    }
}

impl DirectusApi for MockDirectus {
    fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_refresh_token.lock().unwrap() = Some(refresh_token.to_string());
        self.grant.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    fn current_user(&self, _access_token: &str) -> Result<RecipientId> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        self.user.lock().unwrap().clone().map_err(|e| anyhow!(e))
    }

    fn latest_notification(
        &self,
        _access_token: &str,
        query: &InboxQuery,
    ) -> Result<Option<InboxItem>> {
        self.inbox_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_query.lock().unwrap() = Some(query.clone());
        if self.reject_next_token.swap(false, Ordering::SeqCst) {
            return Err(TokenExpiredError.into());
        }
        match self.inbox.lock().unwrap().pop_front() {
            Some(response) => response.map_err(|e| anyhow!(e)),
            None => Ok(None),
        }
    }
}

/// Notifier that records every alert
#[derive(Default)]
pub struct RecordingNotifier {
    alerts: Mutex<Vec<Alert>>,
}

impl RecordingNotifier {
    pub fn count(&self) -> usize {
        self.alerts.lock().unwrap().len()
    }

    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, alert: &Alert) {
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_defaults() {
        let api = MockDirectus::default();

        let grant = api.refresh("r1").unwrap();
        assert_eq!(grant.access_token.as_deref(), Some("a1"));
        assert_eq!(grant.refresh_token.as_deref(), Some("r2"));
        assert_eq!(api.current_user("a1").unwrap(), RecipientId::new("u1"));

        let query = InboxQuery::latest_for(RecipientId::new("u1"));
        assert!(api.latest_notification("a1", &query).unwrap().is_none());
        assert_eq!(api.refresh_calls(), 1);
        assert_eq!(api.inbox_calls(), 1);
    }
}
