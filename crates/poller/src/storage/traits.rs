//! Storage trait definitions

use anyhow::Result;

/// Persistent key-value store scoped by origin
///
/// `origin` is the ASCII serialization of a URL origin, e.g.
/// `https://amc.flexsked.com`.
pub trait CookieStore: Send + Sync {
    /// Read a value, `None` if it was never set
    fn get(&self, origin: &str, name: &str) -> Result<Option<String>>;

    /// Insert or overwrite a value
    fn set(&self, origin: &str, name: &str, value: &str) -> Result<()>;
}
