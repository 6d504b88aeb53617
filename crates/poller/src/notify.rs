//! Desktop alert contract
//!
//! Rendering the alert belongs to the host; the poller only decides when.

/// Content of the walk-in alert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub title: String,
    pub body: String,
    /// Icon name or path understood by the host's notification backend
    pub icon: String,
    /// Keep the alert on screen until the user dismisses it
    pub require_interaction: bool,
}

impl Default for Alert {
    fn default() -> Self {
        Self {
            title: "New Walk-In User".to_string(),
            body: "You have a new walk-in user!".to_string(),
            icon: "logo.png".to_string(),
            require_interaction: true,
        }
    }
}

/// Fire-and-forget alert sink
pub trait Notifier: Send + Sync {
    fn notify(&self, alert: &Alert);
}
