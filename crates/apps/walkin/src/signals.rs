//! Bridges the process environment into host events
//!
//! - Ctrl-C / SIGTERM: shutdown
//! - SIGHUP: re-arm polling
//! - stdin: one JSON host message per line
//! - a wall-clock watchdog that reports system sleep as suspend + resume

use log::{debug, error, info, warn};
use poller::{CoordinatorHandle, HostEvent, HostMessage};
use std::time::{Duration, Instant, SystemTime};
use tokio::io::{AsyncBufReadExt, BufReader};

/// How often the sleep watchdog samples the clocks
const WATCHDOG_INTERVAL: Duration = Duration::from_secs(20);

/// Wall-clock time beyond monotonic time that counts as a system sleep
const SLEEP_THRESHOLD: Duration = Duration::from_secs(10);

/// Start all bridges; each ends once the coordinator stops accepting events
pub fn spawn(handle: CoordinatorHandle) {
    tokio::spawn(forward_ctrl_c(handle.clone()));
    tokio::spawn(forward_stdin(handle.clone()));
    tokio::spawn(watch_for_sleep(handle.clone()));
    #[cfg(unix)]
    tokio::spawn(forward_unix_signals(handle));
}

async fn forward_ctrl_c(handle: CoordinatorHandle) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Interrupt received, shutting down");
            let _ = handle.shutdown();
        }
        Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
    }
}

async fn forward_stdin(handle: CoordinatorHandle) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match HostMessage::parse(line) {
                    Ok(message) => {
                        if handle.send(message.into()).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Ignoring host message: {:#}", e),
                }
            }
            Ok(None) => {
                debug!("stdin closed, no more host messages");
                break;
            }
            Err(e) => {
                warn!("Failed to read host messages: {}", e);
                break;
            }
        }
    }
}

#[cfg(unix)]
async fn forward_unix_signals(handle: CoordinatorHandle) {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut terminate, mut hangup) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::hangup()),
    ) {
        (Ok(terminate), Ok(hangup)) => (terminate, hangup),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            return;
        }
    };

    loop {
        let event = tokio::select! {
            _ = terminate.recv() => HostEvent::Shutdown,
            _ = hangup.recv() => HostEvent::Resume,
        };
        let stop = event == HostEvent::Shutdown;
        if handle.send(event).is_err() || stop {
            break;
        }
    }
}

/// Monotonic time stops while the machine sleeps; wall-clock time does not.
async fn watch_for_sleep(handle: CoordinatorHandle) {
    let mut ticker = tokio::time::interval(WATCHDOG_INTERVAL);
    let mut last_instant = Instant::now();
    let mut last_wall = SystemTime::now();

    loop {
        ticker.tick().await;
        let now_instant = Instant::now();
        let now_wall = SystemTime::now();

        let monotonic = now_instant.duration_since(last_instant);
        let wall = now_wall.duration_since(last_wall).unwrap_or_default();
        last_instant = now_instant;
        last_wall = now_wall;

        if slept(wall, monotonic) {
            info!("System sleep of about {:?} detected", wall.saturating_sub(monotonic));
            if handle.send(HostEvent::Suspend).is_err() || handle.send(HostEvent::Resume).is_err() {
                break;
            }
        }
    }
}

fn slept(wall: Duration, monotonic: Duration) -> bool {
    wall.saturating_sub(monotonic) > SLEEP_THRESHOLD
}
