//! Refresh-token adapter over the cookie store

use anyhow::Result;
use std::sync::Arc;
use url::Url;

use super::CookieStore;

/// Cookie name Directus uses for the refresh token
pub const REFRESH_TOKEN_COOKIE: &str = "directus_refresh_token";

/// Reads and writes the single refresh token for the API origin
#[derive(Clone)]
pub struct RefreshTokenStore {
    cookies: Arc<dyn CookieStore>,
    origin: String,
}

impl RefreshTokenStore {
    /// Bind `cookies` to the origin of `api_base_url`
    pub fn new(cookies: Arc<dyn CookieStore>, api_base_url: &Url) -> Self {
        Self {
            cookies,
            origin: api_base_url.origin().ascii_serialization(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Current refresh token; an empty value counts as absent
    pub fn load(&self) -> Result<Option<String>> {
        Ok(self
            .cookies
            .get(&self.origin, REFRESH_TOKEN_COOKIE)?
            .filter(|token| !token.is_empty()))
    }

    /// Overwrite the stored refresh token
    pub fn save(&self, token: &str) -> Result<()> {
        self.cookies.set(&self.origin, REFRESH_TOKEN_COOKIE, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryCookieStore;

    fn base_url() -> Url {
        Url::parse("https://amc.flexsked.com/some/path").unwrap()
    }

    #[test]
    fn test_origin_drops_path() {
        let store = RefreshTokenStore::new(Arc::new(InMemoryCookieStore::new()), &base_url());
        assert_eq!(store.origin(), "https://amc.flexsked.com");
    }

    #[test]
    fn test_save_then_load() {
        let cookies = Arc::new(InMemoryCookieStore::new());
        let store = RefreshTokenStore::new(cookies.clone(), &base_url());

        assert!(store.load().unwrap().is_none());
        store.save("r1").unwrap();

        assert_eq!(store.load().unwrap().as_deref(), Some("r1"));
        assert_eq!(
            cookies
                .get("https://amc.flexsked.com", REFRESH_TOKEN_COOKIE)
                .unwrap()
                .as_deref(),
            Some("r1")
        );
    }

    #[test]
    fn test_empty_token_is_absent() {
        let cookies = Arc::new(InMemoryCookieStore::new());
        cookies
            .set("https://amc.flexsked.com", REFRESH_TOKEN_COOKIE, "")
            .unwrap();

        let store = RefreshTokenStore::new(cookies, &base_url());
        assert!(store.load().unwrap().is_none());
    }
}
