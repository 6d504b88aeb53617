//! Authenticated session state

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the authenticated Directus user, used to scope the inbox
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecipientId(String);

impl RecipientId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecipientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecipientId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Credentials used for inbox queries
///
/// Normally both fields are acquired together by one authentication attempt,
/// access token first. An access token injected by the host arrives without
/// a recipient; the recipient is then resolved before the first query.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub recipient_id: Option<RecipientId>,
}

impl Session {
    /// A session produced by a complete authentication attempt
    pub fn authenticated(access_token: impl Into<String>, recipient_id: RecipientId) -> Self {
        Self {
            access_token: Some(access_token.into()),
            recipient_id: Some(recipient_id),
        }
    }

    /// True when both the access token and the recipient are known
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some() && self.recipient_id.is_some()
    }

    /// Replace the access token, keeping the recipient resolved so far
    pub fn with_access_token(self, access_token: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            recipient_id: self.recipient_id,
        }
    }
}

// Tokens stay out of logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("recipient_id", &self.recipient_id)
            .finish()
    }
}
