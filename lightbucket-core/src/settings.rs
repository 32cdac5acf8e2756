//! Live session settings and the config store behind them.
//!
//! The pipeline never reads the config file directly. It reads a
//! [`SessionConfig`] snapshot from a [`SettingsHandle`], which the
//! [`ConfigStore`] replaces whenever the file changes on disk or a setter
//! is called. Snapshots are immutable; a dispatch that already holds one
//! keeps using it.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use parking_lot::RwLock;

use crate::config::{Config, LightbucketConfig};
use crate::credentials::CredentialCodec;
use crate::error::{Error, Result};

const WATCH_DEBOUNCE: Duration = Duration::from_millis(250);

/// Decrypted, in-memory reporting settings
#[derive(Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    pub username: String,
    pub api_key: String,
    pub base_url: String,
    pub enabled: bool,
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionConfig")
            .field("username", &self.username)
            .field("api_key", &if self.api_key.is_empty() { "" } else { "<set>" })
            .field("base_url", &self.base_url)
            .field("enabled", &self.enabled)
            .finish()
    }
}

impl SessionConfig {
    /// Decrypt a persisted config section
    pub fn from_config(config: &LightbucketConfig, codec: &CredentialCodec) -> Result<Self> {
        Ok(Self {
            username: config.username.clone(),
            api_key: codec.decrypt(&config.api_key)?,
            base_url: config.base_url.clone(),
            enabled: config.enabled,
        })
    }

    /// Both username and API key are non-empty
    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.api_key.is_empty()
    }

    /// Reporting is switched on and credentials are present
    pub fn is_ready(&self) -> bool {
        self.enabled && self.has_credentials()
    }

    /// Full URL of the capture-complete endpoint
    pub fn endpoint(&self) -> String {
        format!(
            "{}/api/image_capture_complete",
            self.base_url.trim_end_matches('/')
        )
    }
}

/// A single property update, mirroring what a settings UI would emit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingChange {
    Username(String),
    /// Decrypted API key
    ApiKey(String),
    /// Username and decrypted API key, published together
    Credentials { username: String, api_key: String },
    Enabled(bool),
    BaseUrl(String),
}

/// Shared handle to the current [`SessionConfig`]
#[derive(Debug, Clone, Default)]
pub struct SettingsHandle {
    inner: Arc<RwLock<Arc<SessionConfig>>>,
}

impl SettingsHandle {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(Arc::new(config))),
        }
    }

    /// Current settings. Cheap; later changes do not affect the returned value.
    pub fn snapshot(&self) -> Arc<SessionConfig> {
        Arc::clone(&self.inner.read())
    }

    /// Replace all settings at once
    pub fn replace(&self, config: SessionConfig) {
        *self.inner.write() = Arc::new(config);
    }

    /// Apply a single property change
    pub fn apply(&self, change: SettingChange) {
        let mut guard = self.inner.write();
        let mut next = SessionConfig::clone(&guard);
        match change {
            SettingChange::Username(username) => next.username = username,
            SettingChange::ApiKey(api_key) => next.api_key = api_key,
            SettingChange::Credentials { username, api_key } => {
                next.username = username;
                next.api_key = api_key;
            }
            SettingChange::Enabled(enabled) => next.enabled = enabled,
            SettingChange::BaseUrl(base_url) => next.base_url = base_url,
        }
        *guard = Arc::new(next);
    }
}

/// Persisted configuration plus the live snapshot derived from it
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
    codec: CredentialCodec,
    settings: SettingsHandle,
}

impl ConfigStore {
    /// Open the store at `path`, loading it immediately.
    ///
    /// A missing file yields default (disabled) settings. A stored API key
    /// that cannot be decrypted (lost key file, hand-edited config) is
    /// treated as unset so the credentials can be entered again.
    pub fn open(path: PathBuf, codec: CredentialCodec) -> Result<Self> {
        let store = Self {
            path,
            codec,
            settings: SettingsHandle::default(),
        };

        let config = store.load_config()?;
        let session = match SessionConfig::from_config(&config.lightbucket, &store.codec) {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(
                    path = %store.path.display(),
                    error = %e,
                    "Stored API key cannot be decrypted, treating it as unset"
                );
                SessionConfig {
                    username: config.lightbucket.username.clone(),
                    api_key: String::new(),
                    base_url: config.lightbucket.base_url.clone(),
                    enabled: config.lightbucket.enabled,
                }
            }
        };
        store.settings.replace(session);
        Ok(store)
    }

    /// Open the store at the XDG default locations
    pub fn open_default() -> Result<Self> {
        let codec = CredentialCodec::load_or_create(&Config::key_path())?;
        Self::open(Config::config_path(), codec)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn codec(&self) -> &CredentialCodec {
        &self.codec
    }

    /// Handle the pipeline reads from
    pub fn settings(&self) -> SettingsHandle {
        self.settings.clone()
    }

    /// Read the persisted config, or defaults if the file does not exist
    pub fn load_config(&self) -> Result<Config> {
        if self.path.exists() {
            Config::load_from(&self.path)
        } else {
            Ok(Config::default())
        }
    }

    /// Re-read the file and publish a new snapshot.
    ///
    /// On failure the previous snapshot stays in place.
    pub fn reload(&self) -> Result<()> {
        let config = self.load_config()?;
        let next = SessionConfig::from_config(&config.lightbucket, &self.codec)?;
        let previous = self.settings.snapshot();

        if *previous != next {
            tracing::info!(
                enabled = next.enabled,
                username_changed = previous.username != next.username,
                api_key_changed = previous.api_key != next.api_key,
                base_url = %next.base_url,
                "Lightbucket settings reloaded"
            );
        }

        self.settings.replace(next);
        Ok(())
    }

    /// Store new credentials. Both values are trimmed; the key is encrypted.
    pub fn set_credentials(&self, username: &str, api_key: &str) -> Result<()> {
        let username = username.trim().to_string();
        let api_key = api_key.trim().to_string();

        let mut config = self.load_config()?;
        config.lightbucket.username = username.clone();
        config.lightbucket.api_key = self.codec.encrypt(&api_key)?;
        config.save_to(&self.path)?;

        self.settings.apply(SettingChange::Credentials { username, api_key });
        Ok(())
    }

    /// Switch reporting on or off
    pub fn set_enabled(&self, enabled: bool) -> Result<()> {
        let mut config = self.load_config()?;
        config.lightbucket.enabled = enabled;
        config.save_to(&self.path)?;

        self.settings.apply(SettingChange::Enabled(enabled));
        Ok(())
    }

    /// Reload whenever the config file changes on disk.
    ///
    /// Watching stops when the returned [`ConfigWatcher`] is dropped.
    pub fn watch(&self) -> Result<ConfigWatcher> {
        let dir = self
            .path
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::Config(format!("config path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(&dir)?;

        let store = self.clone();
        let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |res: DebounceEventResult| {
            match res {
                Ok(events) => {
                    let file_name = store.path.file_name();
                    if !events.iter().any(|event| event.path.file_name() == file_name) {
                        return;
                    }
                    if let Err(e) = store.reload() {
                        tracing::warn!(error = %e, "Failed to reload Lightbucket settings");
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Config watch error"),
            }
        })
        .map_err(|e| Error::Config(format!("failed to create config watcher: {}", e)))?;

        // Watch the directory: editors often replace the file instead of writing in place.
        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| Error::Config(format!("failed to watch {:?}: {}", dir, e)))?;

        tracing::debug!(path = %self.path.display(), "Watching config file");
        Ok(ConfigWatcher {
            _debouncer: debouncer,
        })
    }
}

/// Keeps a config file watch alive
pub struct ConfigWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}
