//! Cookie storage and the refresh-token adapter
//!
//! The host keeps credentials in a cookie-like key-value store scoped by
//! origin. The trait-based design allows swapping between the in-memory and
//! file-backed implementations.

mod file;
mod memory;
mod refresh_token;
mod traits;

pub use file::FileCookieStore;
pub use memory::InMemoryCookieStore;
pub use refresh_token::{REFRESH_TOKEN_COOKIE, RefreshTokenStore};
pub use traits::CookieStore;
