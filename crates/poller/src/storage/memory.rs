//! In-memory cookie store

use anyhow::{Result, anyhow};
use std::collections::HashMap;
use std::sync::RwLock;

use super::CookieStore;

/// In-memory implementation of CookieStore
///
/// Used by tests and by embedders that keep credentials elsewhere.
#[derive(Default)]
pub struct InMemoryCookieStore {
    cookies: RwLock<HashMap<(String, String), String>>,
}

impl InMemoryCookieStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl CookieStore for InMemoryCookieStore {
    fn get(&self, origin: &str, name: &str) -> Result<Option<String>> {
        let cookies = self
            .cookies
            .read()
            .map_err(|_| anyhow!("cookie store lock poisoned"))?;
        Ok(cookies
            .get(&(origin.to_string(), name.to_string()))
            .cloned())
    }

    fn set(&self, origin: &str, name: &str, value: &str) -> Result<()> {
        let mut cookies = self
            .cookies
            .write()
            .map_err(|_| anyhow!("cookie store lock poisoned"))?;
        cookies.insert((origin.to_string(), name.to_string()), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_values_are_scoped_by_origin() {
        let store = InMemoryCookieStore::new();
        store.set("https://a.example", "token", "one").unwrap();

        assert_eq!(
            store.get("https://a.example", "token").unwrap().as_deref(),
            Some("one")
        );
        assert!(store.get("https://b.example", "token").unwrap().is_none());
    }

    #[test]
    fn test_set_overwrites() {
        let store = InMemoryCookieStore::new();
        store.set("https://a.example", "token", "one").unwrap();
        store.set("https://a.example", "token", "two").unwrap();

        assert_eq!(
            store.get("https://a.example", "token").unwrap().as_deref(),
            Some("two")
        );
    }
}
