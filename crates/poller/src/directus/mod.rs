//! Directus API integration
//!
//! This module provides:
//! - The `DirectusApi` seam used by the session manager and inbox watcher
//! - An HTTP client for the refresh, identity and notifications endpoints
//! - The inbox query builder

mod client;
mod query;

use anyhow::Result;

use crate::models::{InboxItem, RecipientId};

pub use client::{DirectusClient, TokenExpiredError};
pub use query::InboxQuery;

/// Remote calls made by the poller
///
/// Methods are synchronous so implementations stay executor-agnostic; the
/// coordinator runs them on the blocking pool.
pub trait DirectusApi: Send + Sync {
    /// Exchange a refresh token for a new access token and a rotated refresh token
    fn refresh(&self, refresh_token: &str) -> Result<api::TokenGrant>;

    /// Identity of the user owning `access_token`
    fn current_user(&self, access_token: &str) -> Result<RecipientId>;

    /// Run the inbox query, returning the first result if any
    ///
    /// A rejected access token is reported as [`TokenExpiredError`].
    fn latest_notification(&self, access_token: &str, query: &InboxQuery)
    -> Result<Option<InboxItem>>;
}

/// Directus API request and response types
pub mod api {
    use serde::{Deserialize, Serialize};

    use crate::models::RecipientId;

    /// Every Directus response wraps its payload in `data`
    #[derive(Debug, Deserialize)]
    pub struct Envelope<T> {
        pub data: Option<T>,
    }

    /// Body of `POST /auth/refresh`
    #[derive(Debug, Serialize)]
    pub struct RefreshRequest<'a> {
        pub refresh_token: &'a str,
        pub mode: &'a str,
    }

    /// Payload of a refresh response
    ///
    /// Fields are optional because the rotated refresh token must be stored
    /// even when the access token is missing.
    #[derive(Debug, Clone, Default, PartialEq, Deserialize)]
    pub struct TokenGrant {
        pub access_token: Option<String>,
        pub refresh_token: Option<String>,
        /// Access token lifetime in milliseconds
        pub expires: Option<u64>,
    }

    /// Payload of `GET /users/me`
    #[derive(Debug, Deserialize)]
    pub struct UserRecord {
        pub id: RecipientId,
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::models::InboxItem;

        #[test]
        fn test_parse_refresh_response() {
            let json = r#"{"data": {"access_token": "a1", "expires": 900000, "refresh_token": "r2"}}"#;
            let envelope: Envelope<TokenGrant> = serde_json::from_str(json).unwrap();
            let grant = envelope.data.unwrap();

            assert_eq!(grant.access_token.as_deref(), Some("a1"));
            assert_eq!(grant.refresh_token.as_deref(), Some("r2"));
            assert_eq!(grant.expires, Some(900_000));
        }

        #[test]
        fn test_parse_refresh_response_without_access_token() {
            let json = r#"{"data": {"refresh_token": "r2"}}"#;
            let envelope: Envelope<TokenGrant> = serde_json::from_str(json).unwrap();
            let grant = envelope.data.unwrap();

            assert!(grant.access_token.is_none());
            assert_eq!(grant.refresh_token.as_deref(), Some("r2"));
        }

        #[test]
        fn test_parse_error_response_has_no_data() {
            let json = r#"{"errors": [{"message": "Invalid user credentials."}]}"#;
            let envelope: Envelope<TokenGrant> = serde_json::from_str(json).unwrap();
            assert!(envelope.data.is_none());
        }

        #[test]
        fn test_parse_notifications_response() {
            let json = r#"{"data": [{
                "id": 5,
                "subject": "You_have_new_walkin_user",
                "collection": "walkins",
                "item": "18",
                "timestamp": "2024-05-01T12:00:00.000Z"
            }]}"#;
            let envelope: Envelope<Vec<InboxItem>> = serde_json::from_str(json).unwrap();
            let items = envelope.data.unwrap();

            assert_eq!(items.len(), 1);
            assert_eq!(items[0].id.as_str(), "5");
            assert_eq!(items[0].collection.as_deref(), Some("walkins"));
        }
    }
}
