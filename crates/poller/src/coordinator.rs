//! Coordinator: owns the poller state and reacts to events
//!
//! Every state transition happens on the coordinator task. Blocking work
//! (cookie store, HTTP) runs on the blocking pool and reports back through
//! the same event channel as host signals and timer ticks, so the session,
//! the last-seen id and both timers never need a lock.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use url::Url;

use crate::auth::{AuthError, SessionManager};
use crate::config::PollerConfig;
use crate::directus::{DirectusApi, TokenExpiredError};
use crate::host::HostEvent;
use crate::inbox::{InboxWatcher, Observation};
use crate::models::{InboxItem, LastSeen, NotificationId, RecipientId, Session};
use crate::notify::{Alert, Notifier};
use crate::schedule::{Backoff, PollScheduler, RetryTimer};
use crate::storage::{CookieStore, RefreshTokenStore};

/// Timing and alert settings for a coordinator
#[derive(Debug, Clone)]
pub struct PollSettings {
    pub poll_interval: Duration,
    pub backoff: Backoff,
    pub alert: Alert,
}

impl PollSettings {
    pub fn from_config(config: &PollerConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            backoff: config.backoff(),
            alert: config.alert(),
        }
    }
}

/// Snapshot of the poller published after every event
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PollerStatus {
    /// Access token and recipient are both known
    pub authenticated: bool,
    pub recipient_id: Option<RecipientId>,
    /// A poll timer is armed
    pub polling: bool,
    pub last_seen: Option<NotificationId>,
    /// Authentication attempts dispatched since start
    pub auth_attempts: u32,
    pub notifications_shown: u64,
    pub last_poll_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Mutable state owned by the coordinator
#[derive(Debug, Default)]
struct PollerState {
    session: Session,
    last_seen: LastSeen,
}

enum Event {
    Host(HostEvent),
    Tick { generation: u64 },
    RetryAuthentication,
    AuthCompleted(Result<Session, AuthError>),
    IdentityResolved {
        access_token: String,
        result: Result<RecipientId, AuthError>,
    },
    InboxFetched {
        access_token: String,
        result: Result<Option<InboxItem>>,
    },
}

/// Cloneable handle for feeding host events and watching status
#[derive(Clone)]
pub struct CoordinatorHandle {
    events: mpsc::UnboundedSender<Event>,
    status: watch::Receiver<PollerStatus>,
}

impl CoordinatorHandle {
    /// Deliver a host event. Fails once the coordinator has stopped.
    pub fn send(&self, event: HostEvent) -> Result<()> {
        self.events
            .send(Event::Host(event))
            .map_err(|_| anyhow!("poller has stopped"))
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(HostEvent::Shutdown)
    }

    /// Receiver that observes every published status
    pub fn status(&self) -> watch::Receiver<PollerStatus> {
        self.status.clone()
    }

    pub fn snapshot(&self) -> PollerStatus {
        self.status.borrow().clone()
    }
}

/// Drives authentication, polling and alerting
pub struct Coordinator {
    sessions: Arc<SessionManager>,
    watcher: Arc<InboxWatcher>,
    notifier: Arc<dyn Notifier>,
    alert: Alert,
    state: PollerState,
    scheduler: PollScheduler,
    backoff: Backoff,
    retry: RetryTimer,
    status: PollerStatus,
    status_tx: watch::Sender<PollerStatus>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl Coordinator {
    pub fn new(
        sessions: SessionManager,
        watcher: InboxWatcher,
        notifier: Arc<dyn Notifier>,
        settings: PollSettings,
    ) -> (Self, CoordinatorHandle) {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (status_tx, status_rx) = watch::channel(PollerStatus::default());

        let handle = CoordinatorHandle {
            events: events_tx.clone(),
            status: status_rx,
        };

        let coordinator = Self {
            sessions: Arc::new(sessions),
            watcher: Arc::new(watcher),
            notifier,
            alert: settings.alert,
            state: PollerState::default(),
            scheduler: PollScheduler::new(settings.poll_interval),
            backoff: settings.backoff,
            retry: RetryTimer::new(),
            status: PollerStatus::default(),
            status_tx,
            events_tx,
            events_rx,
        };

        (coordinator, handle)
    }

    /// Wire a coordinator from config, an API implementation and a cookie store
    pub fn from_config(
        config: &PollerConfig,
        api: Arc<dyn DirectusApi>,
        cookies: Arc<dyn CookieStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<(Self, CoordinatorHandle)> {
        let api_url: Url = config.api_url()?;
        let sessions = SessionManager::new(api.clone(), RefreshTokenStore::new(cookies, &api_url));
        let watcher = InboxWatcher::new(api, config.trigger_subject.clone());
        Ok(Self::new(
            sessions,
            watcher,
            notifier,
            PollSettings::from_config(config),
        ))
    }

    /// Process events until a `Shutdown` host event arrives
    pub async fn run(mut self) {
        info!(
            "Poller running, checking inbox every {:?}",
            self.scheduler.interval()
        );

        while let Some(event) = self.events_rx.recv().await {
            let keep_running = self.handle(event);
            self.publish();
            if !keep_running {
                break;
            }
        }

        self.scheduler.stop();
        self.retry.cancel();
        self.status.polling = false;
        self.publish();
        info!("Poller stopped");
    }

    fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Host(event) => return self.on_host_event(event),
            Event::Tick { generation } => {
                if self.scheduler.is_current(generation) {
                    self.check_inbox();
                } else {
                    debug!("Dropping tick from superseded timer #{}", generation);
                }
            }
            Event::RetryAuthentication => self.authenticate(),
            Event::AuthCompleted(result) => self.on_auth_completed(result),
            Event::IdentityResolved {
                access_token,
                result,
            } => self.on_identity_resolved(access_token, result),
            Event::InboxFetched {
                access_token,
                result,
            } => self.on_inbox_fetched(access_token, result),
        }
        true
    }

    fn on_host_event(&mut self, event: HostEvent) -> bool {
        info!("Host event: {:?}", event);
        match event {
            HostEvent::Startup | HostEvent::Installed => self.authenticate(),
            HostEvent::Suspend => debug!("Suspend signalled, polling is re-armed on resume"),
            HostEvent::Resume => self.start_polling(),
            HostEvent::StartPolling { access_token } => {
                let session = std::mem::take(&mut self.state.session);
                self.state.session = session.with_access_token(access_token.clone());
                if self.state.session.recipient_id.is_none() {
                    self.resolve_identity(access_token);
                }
                self.start_polling();
            }
            HostEvent::Shutdown => return false,
        }
        true
    }

    /// Dispatch one authentication attempt
    fn authenticate(&mut self) {
        self.retry.cancel();
        self.status.auth_attempts += 1;
        let sessions = Arc::clone(&self.sessions);
        self.spawn_blocking(move || sessions.authenticate(), Event::AuthCompleted);
    }

    fn on_auth_completed(&mut self, result: Result<Session, AuthError>) {
        match result {
            Ok(session) => {
                self.backoff.reset();
                self.retry.cancel();
                self.state.session = session;
                self.status.last_error = None;
                self.start_polling();
            }
            Err(err) if err.is_retryable() => {
                let delay = self.backoff.next_delay();
                info!("{}, retrying in {:?}", err, delay);
                let events = self.events_tx.clone();
                self.retry.schedule(delay, move || {
                    let _ = events.send(Event::RetryAuthentication);
                });
                self.status.last_error = Some(err.to_string());
            }
            Err(err) => {
                error!("Authentication failed: {}", err);
                self.status.last_error = Some(err.to_string());
            }
        }
    }

    fn resolve_identity(&mut self, access_token: String) {
        let sessions = Arc::clone(&self.sessions);
        self.spawn_blocking(
            move || {
                let result = sessions.resolve_identity(&access_token);
                Event::IdentityResolved {
                    access_token,
                    result,
                }
            },
            |event| event,
        );
    }

    fn on_identity_resolved(&mut self, access_token: String, result: Result<RecipientId, AuthError>) {
        if self.state.session.access_token.as_deref() != Some(access_token.as_str()) {
            debug!("Ignoring identity for a replaced access token");
            return;
        }
        match result {
            Ok(recipient_id) => {
                info!("Resolved recipient {}", recipient_id);
                self.state.session.recipient_id = Some(recipient_id);
            }
            Err(err) => {
                warn!("{}", err);
                self.status.last_error = Some(err.to_string());
            }
        }
    }

    /// Re-arm the poll timer, superseding any running one
    fn start_polling(&mut self) {
        let events = self.events_tx.clone();
        self.scheduler
            .start(move |generation| events.send(Event::Tick { generation }).is_ok());
        self.status.polling = true;
    }

    /// One poll tick: query the inbox, or re-establish the session first
    fn check_inbox(&mut self) {
        let session = &self.state.session;
        match (session.access_token.clone(), session.recipient_id.clone()) {
            (None, _) => {
                info!("No access token, authenticating");
                self.authenticate();
            }
            (Some(access_token), None) => self.resolve_identity(access_token),
            (Some(access_token), Some(recipient_id)) => {
                let watcher = Arc::clone(&self.watcher);
                self.spawn_blocking(
                    move || {
                        let result = watcher.fetch_latest(&access_token, &recipient_id);
                        Event::InboxFetched {
                            access_token,
                            result,
                        }
                    },
                    |event| event,
                );
            }
        }
    }

    fn on_inbox_fetched(&mut self, access_token: String, result: Result<Option<InboxItem>>) {
        self.status.last_poll_at = Some(Utc::now());

        let latest = match result {
            Ok(latest) => latest,
            Err(err) if err.is::<TokenExpiredError>() => {
                // Only the token that made the request is known to be dead.
                if self.state.session.access_token.as_deref() != Some(access_token.as_str()) {
                    debug!("Ignoring rejection of a replaced access token");
                    return;
                }
                info!("Access token rejected, re-authenticating on next tick");
                self.state.session.access_token = None;
                return;
            }
            Err(err) => {
                warn!("Error fetching notifications: {:#}", err);
                self.status.last_error = Some(format!("{:#}", err));
                return;
            }
        };

        match self.watcher.observe(&mut self.state.last_seen, latest.as_ref()) {
            Observation::Advanced { id, notify: true } => {
                info!("New walk-in notification {}", id);
                self.notifier.notify(&self.alert);
                self.status.notifications_shown += 1;
            }
            Observation::Advanced { id, notify: false } => {
                debug!("New notification {} does not match the trigger", id);
            }
            Observation::Unchanged(id) => debug!("Notification {} already seen", id),
            Observation::Empty => debug!("Inbox is empty"),
        }
        self.status.last_error = None;
    }

    /// Run `work` on the blocking pool and feed its result back as an event
    fn spawn_blocking<T, W, M>(&self, work: W, into_event: M)
    where
        T: Send + 'static,
        W: FnOnce() -> T + Send + 'static,
        M: FnOnce(T) -> Event + Send + 'static,
    {
        let events = self.events_tx.clone();
        tokio::spawn(async move {
            match tokio::task::spawn_blocking(work).await {
                Ok(output) => {
                    let _ = events.send(into_event(output));
                }
                Err(e) => error!("Background task failed: {}", e),
            }
        });
    }

    fn publish(&mut self) {
        let session = &self.state.session;
        self.status.authenticated = session.is_authenticated();
        self.status.recipient_id = session.recipient_id.clone();
        self.status.polling = self.status.polling && self.scheduler.is_active();
        self.status.last_seen = self.state.last_seen.get().cloned();
        self.status_tx.send_replace(self.status.clone());
    }
}
