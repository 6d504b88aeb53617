//! Poller crate - Walk-in alerts from a Directus notification inbox
//!
//! This crate provides the background polling core:
//! - Refresh-token storage scoped to the API origin
//! - Directus API client (token refresh, identity, inbox query)
//! - Session manager with retry on a missing credential
//! - Inbox watcher with last-seen de-duplication and trigger filtering
//! - Poll and retry timers with supersession
//! - A coordinator that consumes host events and owns all state
//!
//! Rendering alerts is left to the host through the [`Notifier`] trait.

pub mod auth;
pub mod config;
pub mod coordinator;
pub mod directus;
pub mod host;
pub mod inbox;
pub mod models;
pub mod notify;
pub mod schedule;
pub mod storage;

#[cfg(test)]
mod testing;

pub use auth::{AuthError, SessionManager};
pub use config::{AlertConfig, PollerConfig};
pub use coordinator::{Coordinator, CoordinatorHandle, PollSettings, PollerStatus};
pub use directus::{DirectusApi, DirectusClient, InboxQuery, TokenExpiredError, api::TokenGrant};
pub use host::{HostEvent, HostMessage};
pub use inbox::{InboxWatcher, Observation, WALKIN_SUBJECT};
pub use models::{InboxItem, LastSeen, NotificationId, RecipientId, Session};
pub use notify::{Alert, Notifier};
pub use schedule::{Backoff, PollScheduler, RetryTimer};
pub use storage::{
    CookieStore, FileCookieStore, InMemoryCookieStore, REFRESH_TOKEN_COOKIE, RefreshTokenStore,
};
