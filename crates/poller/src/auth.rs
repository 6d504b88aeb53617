//! Session manager: refresh-token exchange and identity resolution
//!
//! One authentication attempt reads the stored refresh token, exchanges it
//! for an access token, writes the rotated refresh token back and resolves
//! the recipient. The attempt is synchronous; callers decide when to retry.

use log::{debug, info, warn};
use std::sync::Arc;

use crate::directus::DirectusApi;
use crate::models::{RecipientId, Session};
use crate::storage::RefreshTokenStore;

/// Ways an authentication attempt can fail
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Nothing stored yet; recovered by a timed retry of the whole attempt
    #[error("no refresh token stored for {origin}")]
    MissingCredential { origin: String },

    /// The refresh call succeeded but carried no access token
    #[error("access token not found in refresh response")]
    MissingAccessToken,

    /// The "who am I" lookup failed
    #[error("failed to resolve recipient: {0:#}")]
    Identity(anyhow::Error),

    /// The refresh call itself failed (network, status, malformed body)
    #[error("failed to refresh access token: {0:#}")]
    Exchange(anyhow::Error),
}

impl AuthError {
    /// Only a missing credential is retried automatically
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthError::MissingCredential { .. })
    }
}

/// Owns the authentication lifecycle against the Directus API
pub struct SessionManager {
    api: Arc<dyn DirectusApi>,
    tokens: RefreshTokenStore,
}

impl SessionManager {
    pub fn new(api: Arc<dyn DirectusApi>, tokens: RefreshTokenStore) -> Self {
        Self { api, tokens }
    }

    pub fn tokens(&self) -> &RefreshTokenStore {
        &self.tokens
    }

    /// Run one complete authentication attempt
    ///
    /// The rotated refresh token is persisted as soon as the refresh call
    /// returns, before the access token is inspected.
    pub fn authenticate(&self) -> Result<Session, AuthError> {
        let refresh_token = self.load_refresh_token().ok_or_else(|| AuthError::MissingCredential {
            origin: self.tokens.origin().to_string(),
        })?;

        debug!("Exchanging refresh token for {}", self.tokens.origin());
        let grant = self
            .api
            .refresh(&refresh_token)
            .map_err(AuthError::Exchange)?;

        match grant.refresh_token.as_deref() {
            Some(rotated) => {
                if let Err(e) = self.tokens.save(rotated) {
                    warn!("Failed to store rotated refresh token: {:#}", e);
                }
            }
            None => warn!("Refresh response did not include a rotated refresh token"),
        }

        let access_token = grant.access_token.ok_or(AuthError::MissingAccessToken)?;
        let recipient_id = self.resolve_identity(&access_token)?;

        info!("Authenticated as recipient {}", recipient_id);
        Ok(Session::authenticated(access_token, recipient_id))
    }

    /// Look up the recipient that owns `access_token`
    pub fn resolve_identity(&self, access_token: &str) -> Result<RecipientId, AuthError> {
        self.api
            .current_user(access_token)
            .map_err(AuthError::Identity)
    }

    // A store that cannot be read is treated like an empty one, so the
    // attempt is retried instead of abandoned.
    fn load_refresh_token(&self) -> Option<String> {
        match self.tokens.load() {
            Ok(token) => token,
            Err(e) => {
                warn!("Failed to read refresh token: {:#}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directus::api::TokenGrant;
    use crate::storage::InMemoryCookieStore;
    use crate::testing::MockDirectus;
    use url::Url;

    fn manager_with(api: Arc<MockDirectus>, stored: Option<&str>) -> SessionManager {
        let url = Url::parse("https://amc.flexsked.com").unwrap();
        let tokens = RefreshTokenStore::new(Arc::new(InMemoryCookieStore::new()), &url);
        if let Some(token) = stored {
            tokens.save(token).unwrap();
        }
        SessionManager::new(api, tokens)
    }

    #[test]
    fn test_missing_refresh_token_makes_no_calls() {
        let api = Arc::new(MockDirectus::new());
        let manager = manager_with(api.clone(), None);

        let err = manager.authenticate().unwrap_err();
        assert!(matches!(err, AuthError::MissingCredential { .. }));
        assert!(err.is_retryable());
        assert_eq!(api.refresh_calls(), 0);
    }

    #[test]
    fn test_successful_attempt_rotates_and_resolves() {
        let api = Arc::new(MockDirectus::new());
        api.set_grant(Ok(TokenGrant {
            access_token: Some("a1".into()),
            refresh_token: Some("r2".into()),
            expires: Some(900_000),
        }));
        api.set_user(Ok(RecipientId::new("u1")));
        let manager = manager_with(api.clone(), Some("r1"));

        let session = manager.authenticate().unwrap();

        assert_eq!(session, Session::authenticated("a1", RecipientId::new("u1")));
        assert_eq!(api.last_refresh_token().as_deref(), Some("r1"));
        assert_eq!(manager.tokens().load().unwrap().as_deref(), Some("r2"));
    }

    #[test]
    fn test_rotated_token_persists_without_access_token() {
        let api = Arc::new(MockDirectus::new());
        api.set_grant(Ok(TokenGrant {
            access_token: None,
            refresh_token: Some("r2".into()),
            expires: None,
        }));
        let manager = manager_with(api.clone(), Some("r1"));

        let err = manager.authenticate().unwrap_err();

        assert!(matches!(err, AuthError::MissingAccessToken));
        assert!(!err.is_retryable());
        assert_eq!(manager.tokens().load().unwrap().as_deref(), Some("r2"));
        assert_eq!(api.user_calls(), 0);
    }

    #[test]
    fn test_exchange_failure_keeps_stored_token() {
        let api = Arc::new(MockDirectus::new());
        api.set_grant(Err("connection refused".into()));
        let manager = manager_with(api, Some("r1"));

        let err = manager.authenticate().unwrap_err();

        assert!(matches!(err, AuthError::Exchange(_)));
        assert_eq!(manager.tokens().load().unwrap().as_deref(), Some("r1"));
    }

    #[test]
    fn test_identity_failure_fails_attempt() {
        let api = Arc::new(MockDirectus::new());
        api.set_user(Err("401 Unauthorized".into()));
        let manager = manager_with(api, Some("r1"));

        let err = manager.authenticate().unwrap_err();
        assert!(matches!(err, AuthError::Identity(_)));
        // rotation already happened
        assert_eq!(manager.tokens().load().unwrap().as_deref(), Some("r2"));
    }
}
