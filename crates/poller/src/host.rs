//! Signals from the host environment

use anyhow::{Context, Result};
use serde::Deserialize;

/// Lifecycle and control events consumed by the coordinator
#[derive(Clone, PartialEq, Eq)]
pub enum HostEvent {
    /// Process started with an existing profile
    Startup,
    /// First run with a fresh profile
    Installed,
    /// Host is about to suspend the process
    Suspend,
    /// Host resumed the process; polling is re-armed
    Resume,
    /// Use an externally obtained access token and restart polling now
    StartPolling { access_token: String },
    /// Stop all timers and end the event loop
    Shutdown,
}

impl std::fmt::Debug for HostEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HostEvent::Startup => f.write_str("Startup"),
            HostEvent::Installed => f.write_str("Installed"),
            HostEvent::Suspend => f.write_str("Suspend"),
            HostEvent::Resume => f.write_str("Resume"),
            HostEvent::StartPolling { .. } => f.write_str("StartPolling { .. }"),
            HostEvent::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// JSON control message sent by the host UI
///
/// ```json
/// {"action": "startNotificationPolling", "accessToken": "..."}
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "action")]
pub enum HostMessage {
    #[serde(rename = "startNotificationPolling", rename_all = "camelCase")]
    StartNotificationPolling { access_token: String },
}

impl HostMessage {
    pub fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse host message")
    }
}

impl From<HostMessage> for HostEvent {
    fn from(message: HostMessage) -> Self {
        match message {
            HostMessage::StartNotificationPolling { access_token } => {
                HostEvent::StartPolling { access_token }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_start_polling() {
        let message =
            HostMessage::parse(r#"{"action": "startNotificationPolling", "accessToken": "a9"}"#)
                .unwrap();

        assert_eq!(
            HostEvent::from(message),
            HostEvent::StartPolling {
                access_token: "a9".to_string()
            }
        );
    }

    #[test]
    fn test_unknown_action_is_rejected() {
        assert!(HostMessage::parse(r#"{"action": "stopEverything"}"#).is_err());
    }

    #[test]
    fn test_missing_token_is_rejected() {
        assert!(HostMessage::parse(r#"{"action": "startNotificationPolling"}"#).is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let event = HostEvent::StartPolling {
            access_token: "secret".to_string(),
        };
        assert!(!format!("{:?}", event).contains("secret"));
    }
}
