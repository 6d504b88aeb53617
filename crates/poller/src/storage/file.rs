//! File-backed cookie jar
//!
//! Stores every cookie in one JSON document keyed by origin then name:
//!
//! ```json
//! { "https://amc.flexsked.com": { "directus_refresh_token": "..." } }
//! ```

use anyhow::{Context, Result, anyhow};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use super::CookieStore;

/// Cookie jar filename in the config directory
const COOKIE_FILE: &str = "cookies.json";

type Jar = BTreeMap<String, BTreeMap<String, String>>;

/// Cookie store persisted as JSON on disk
pub struct FileCookieStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process
    lock: Mutex<()>,
}

impl FileCookieStore {
    /// Open the jar at an explicit path. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the jar in the default location (~/.config/walkin/cookies.json)
    pub fn open_default() -> Result<Self> {
        let path = config::config_path(COOKIE_FILE).context("Could not determine config directory")?;
        Ok(Self::new(path))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_jar(&self) -> Result<Jar> {
        if !self.path.exists() {
            return Ok(Jar::new());
        }
        config::load_json_file(&self.path)
    }
}

impl CookieStore for FileCookieStore {
    fn get(&self, origin: &str, name: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        let jar = self.read_jar()?;
        Ok(jar.get(origin).and_then(|cookies| cookies.get(name)).cloned())
    }

    fn set(&self, origin: &str, name: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().map_err(|_| anyhow!("cookie jar lock poisoned"))?;
        let mut jar = self.read_jar()?;
        jar.entry(origin.to_string())
            .or_default()
            .insert(name.to_string(), value.to_string());
        config::save_json_file(&self.path, &jar)
            .with_context(|| format!("Failed to save cookie jar: {}", self.path.display()))
    }
}
