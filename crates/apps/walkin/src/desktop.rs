//! Desktop notifications via notify-rust

use log::{debug, warn};
use notify_rust::{Notification, Timeout};
use poller::{Alert, Notifier};

/// Shows alerts through the platform notification service
pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }
}

impl Notifier for DesktopNotifier {
    /// Notifications are fire-and-forget; showing one may block on the
    /// notification daemon, so it happens on its own thread.
    fn notify(&self, alert: &Alert) {
        let alert = alert.clone();
        let app_name = self.app_name.clone();

        std::thread::spawn(move || {
            let timeout = if alert.require_interaction {
                Timeout::Never
            } else {
                Timeout::Default
            };

            match Notification::new()
                .summary(&alert.title)
                .body(&alert.body)
                .icon(&alert.icon)
                .appname(&app_name)
                .timeout(timeout)
                .show()
            {
                Ok(_) => debug!("Shown notification: {}", alert.title),
                Err(e) => warn!("Failed to show notification: {}", e),
            }
        });
    }
}
