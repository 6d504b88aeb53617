//! Poller configuration
//!
//! Resolved in the following order, later steps overriding earlier ones:
//! 1. Built-in defaults (the API URL can be embedded at compile time)
//! 2. JSON file (~/.config/walkin/poller.json)
//! 3. Runtime environment variables

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::inbox::WALKIN_SUBJECT;
use crate::notify::Alert;
use crate::schedule::Backoff;

/// Config filename in the config directory
const CONFIG_FILE: &str = "poller.json";

/// API used when nothing else is configured
const FALLBACK_API_URL: &str = "https://amc.flexsked.com";

/// Settings for the poller and its alert
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    pub api_base_url: String,
    pub poll_interval_secs: u64,
    pub auth_retry_secs: u64,
    /// Upper bound for the retry delay; `None` keeps the delay fixed
    pub auth_retry_max_secs: Option<u64>,
    pub trigger_subject: String,
    pub alert: AlertConfig,
}

/// Alert content as written in the config file
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub require_interaction: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            api_base_url: Self::compiled_api_url().to_string(),
            poll_interval_secs: 10,
            auth_retry_secs: 10,
            auth_retry_max_secs: None,
            trigger_subject: WALKIN_SUBJECT.to_string(),
            alert: AlertConfig::default(),
        }
    }
}

impl Default for AlertConfig {
    fn default() -> Self {
        let alert = Alert::default();
        Self {
            title: alert.title,
            body: alert.body,
            icon: alert.icon,
            require_interaction: alert.require_interaction,
        }
    }
}

impl From<AlertConfig> for Alert {
    fn from(config: AlertConfig) -> Self {
        Self {
            title: config.title,
            body: config.body,
            icon: config.icon,
            require_interaction: config.require_interaction,
        }
    }
}

impl PollerConfig {
    /// Load the config using defaults, the config file and the environment
    pub fn load() -> Result<Self> {
        let config = if config::config_exists(CONFIG_FILE) {
            config::load_json(CONFIG_FILE)?
        } else {
            Self::default()
        };

        let config = config.with_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific JSON file, without environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = config::load_json_file(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string; missing fields take their defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).context("Failed to parse poller config")?;
        config.validate()?;
        Ok(config)
    }

    /// API URL embedded at build time.
    /// Build with: WALKIN_API_URL=https://... cargo build --release
    pub fn compiled_api_url() -> &'static str {
        option_env!("WALKIN_API_URL")
            .filter(|url| !url.is_empty())
            .unwrap_or(FALLBACK_API_URL)
    }

    /// Apply `WALKIN_*` overrides read through `lookup`
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("WALKIN_API_URL") {
            self.api_base_url = url;
        }
        if let Some(secs) = lookup("WALKIN_POLL_INTERVAL_SECS") {
            self.poll_interval_secs = secs
                .parse()
                .with_context(|| format!("Invalid WALKIN_POLL_INTERVAL_SECS: {}", secs))?;
        }
        if let Some(secs) = lookup("WALKIN_AUTH_RETRY_SECS") {
            self.auth_retry_secs = secs
                .parse()
                .with_context(|| format!("Invalid WALKIN_AUTH_RETRY_SECS: {}", secs))?;
        }
        if let Some(secs) = lookup("WALKIN_AUTH_RETRY_MAX_SECS") {
            let max = secs
                .parse()
                .with_context(|| format!("Invalid WALKIN_AUTH_RETRY_MAX_SECS: {}", secs))?;
            self.auth_retry_max_secs = Some(max);
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        self.api_url()?;
        if self.poll_interval_secs == 0 {
            bail!("poll_interval_secs must be greater than zero");
        }
        if self.auth_retry_secs == 0 {
            bail!("auth_retry_secs must be greater than zero");
        }
        Ok(())
    }

    /// The API base URL, checked to be absolute http(s)
    pub fn api_url(&self) -> Result<Url> {
        let url = Url::parse(&self.api_base_url)
            .with_context(|| format!("Invalid api_base_url: {}", self.api_base_url))?;
        if !matches!(url.scheme(), "http" | "https") || !url.has_host() {
            bail!("api_base_url must be an http(s) URL: {}", self.api_base_url);
        }
        Ok(url)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn backoff(&self) -> Backoff {
        let initial = Duration::from_secs(self.auth_retry_secs);
        let max = self
            .auth_retry_max_secs
            .map(Duration::from_secs)
            .unwrap_or(initial);
        Backoff::new(initial, max)
    }

    pub fn alert(&self) -> Alert {
        self.alert.clone().into()
    }

    /// Get the default config file path (~/.config/walkin/poller.json)
    pub fn default_config_path() -> Option<PathBuf> {
        config::config_path(CONFIG_FILE)
    }
}
