//! Walk-in notifier - desktop alerts for new walk-in users
//!
//! Keeps a Directus session alive in the background and raises a desktop
//! notification whenever a new walk-in user lands in the notification inbox.

use anyhow::Result;
use log::{error, info, warn};
use poller::{Coordinator, DirectusClient, FileCookieStore, HostEvent, PollerConfig};
use std::sync::Arc;

mod desktop;
mod signals;

use desktop::DesktopNotifier;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // A missing config directory means this is the first run
    let first_run = !config::config_dir().is_some_and(|dir| dir.exists());
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let settings = match PollerConfig::load() {
        Ok(settings) => settings,
        Err(e) => {
            error!("Invalid configuration: {:#}", e);
            if let Some(path) = PollerConfig::default_config_path() {
                warn!("Check the settings in {} and WALKIN_* environment variables", path.display());
            }
            return Err(e);
        }
    };

    let api_url = settings.api_url()?;
    let cookies = Arc::new(FileCookieStore::open_default()?);
    info!(
        "Watching {} (refresh token in {})",
        api_url,
        cookies.path().display()
    );

    let api = Arc::new(DirectusClient::new(api_url));
    let notifier = Arc::new(DesktopNotifier::new("Walk-In Notifier"));
    let (coordinator, handle) = Coordinator::from_config(&settings, api, cookies, notifier)?;
    let poller = tokio::spawn(coordinator.run());

    if first_run {
        info!("First run, config directory created");
        handle.send(HostEvent::Installed)?;
    } else {
        handle.send(HostEvent::Startup)?;
    }

    signals::spawn(handle);
    poller.await?;
    Ok(())
}
