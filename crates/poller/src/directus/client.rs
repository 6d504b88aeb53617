//! Directus API HTTP client
//!
//! Uses synchronous HTTP (ureq) to be executor-agnostic.

use anyhow::{Context, Result};
use url::Url;

use super::api::{Envelope, RefreshRequest, TokenGrant, UserRecord};
use super::{DirectusApi, InboxQuery};
use crate::models::{InboxItem, RecipientId};

/// Error indicating the access token was rejected by the API
#[derive(Debug, thiserror::Error)]
#[error("Access token expired or invalid")]
pub struct TokenExpiredError;

/// HTTP client for one Directus instance
pub struct DirectusClient {
    base_url: Url,
}

impl DirectusClient {
    /// Create a client for the API rooted at `base_url`
    pub fn new(base_url: Url) -> Self {
        Self { base_url }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path)
    }
}

impl DirectusApi for DirectusClient {
    fn refresh(&self, refresh_token: &str) -> Result<TokenGrant> {
        let mut response = ureq::post(&self.endpoint("/auth/refresh"))
            .send_json(RefreshRequest {
                refresh_token,
                mode: "json",
            })
            .context("Failed to send refresh request")?;

        let envelope: Envelope<TokenGrant> = response
            .body_mut()
            .read_json()
            .context("Failed to parse refresh response")?;

        envelope.data.context("Refresh response missing data")
    }

    fn current_user(&self, access_token: &str) -> Result<RecipientId> {
        let mut response = ureq::get(&self.endpoint("/users/me"))
            .header("Authorization", &format!("Bearer {}", access_token))
            .call()
            .context("Failed to send identity request")?;

        let envelope: Envelope<UserRecord> = response
            .body_mut()
            .read_json()
            .context("Failed to parse identity response")?;

        envelope
            .data
            .map(|user| user.id)
            .context("Identity response missing data")
    }

    fn latest_notification(
        &self,
        access_token: &str,
        query: &InboxQuery,
    ) -> Result<Option<InboxItem>> {
        let url = format!("{}?{}", self.endpoint("/notifications"), query.to_query_string());

        let response = ureq::get(&url)
            .header("Authorization", &format!("Bearer {}", access_token))
            .call();

        let mut response = match response {
            Ok(resp) => resp,
            // Directus answers 401 once the access token has expired
            Err(ureq::Error::StatusCode(401)) => return Err(TokenExpiredError.into()),
            Err(e) => return Err(anyhow::anyhow!("Failed to fetch notifications: {}", e)),
        };

        let envelope: Envelope<Vec<InboxItem>> = response
            .body_mut()
            .read_json()
            .context("Failed to parse notifications response")?;

        Ok(envelope.data.unwrap_or_default().into_iter().next())
    }
}
