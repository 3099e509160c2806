//! Sync configuration and its persistence.
//!
//! [`SyncConfig`] is a single user-settable value selecting the storage
//! provider, its credentials, and which data collections to sync. It is
//! persisted as a whole on every change through [`ConfigStore`] — no
//! batching, no dirty tracking.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{ConfigError, ProviderError};

/// Fixed file name the configuration is stored under.
pub const CONFIG_FILE_NAME: &str = "sync_config.json";

// ---------------------------------------------------------------------------
// Provider selection
// ---------------------------------------------------------------------------

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gist,
    Webdav,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gist => write!(f, "gist"),
            Self::Webdav => write!(f, "webdav"),
        }
    }
}

impl FromStr for ProviderKind {
    type Err = ProviderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gist" => Ok(Self::Gist),
            "webdav" => Ok(Self::Webdav),
            other => Err(ProviderError::NotImplemented(other.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync configuration
// ---------------------------------------------------------------------------

/// User-settable synchronization configuration.
///
/// Exactly one credential group is required, selected by `provider`; the
/// other group's fields are ignored but may stay populated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfig {
    #[serde(default = "default_provider")]
    pub provider: ProviderKind,

    /// GitHub personal access token with the `gist` scope.
    #[serde(default)]
    pub gist_token: Option<String>,

    /// Identifier of the backing gist, assigned by the first upload.
    #[serde(default)]
    pub gist_id: Option<String>,

    /// Base URL of the WebDAV collection holding the snapshot file.
    #[serde(default)]
    pub webdav_url: Option<String>,

    #[serde(default)]
    pub webdav_user: Option<String>,

    #[serde(default)]
    pub webdav_pass: Option<String>,

    #[serde(default = "default_true")]
    pub sync_bookmarks: bool,

    #[serde(default = "default_true")]
    pub sync_extensions: bool,

    #[serde(default = "default_true")]
    pub sync_history: bool,

    /// Minutes between automatic syncs. Persisted for the settings UI but
    /// no scheduler reads it yet.
    #[serde(default = "default_auto_sync_interval")]
    pub auto_sync_interval: u64,
}

fn default_provider() -> ProviderKind {
    ProviderKind::Gist
}
fn default_true() -> bool {
    true
}
fn default_auto_sync_interval() -> u64 {
    30
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            gist_token: None,
            gist_id: None,
            webdav_url: None,
            webdav_user: None,
            webdav_pass: None,
            sync_bookmarks: true,
            sync_extensions: true,
            sync_history: true,
            auto_sync_interval: default_auto_sync_interval(),
        }
    }
}

impl SyncConfig {
    /// Name of the first credential required by the active provider that is
    /// absent or blank, or `None` when the configuration is usable.
    pub fn missing_credential(&self) -> Option<&'static str> {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |s| s.trim().is_empty())
        }

        match self.provider {
            ProviderKind::Gist if blank(&self.gist_token) => Some("gistToken"),
            ProviderKind::Webdav if blank(&self.webdav_url) => Some("webdavUrl"),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

/// Persists the [`SyncConfig`] as a whole to a fixed-name JSON file.
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Store rooted at the given directory.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            path: dir.as_ref().join(CONFIG_FILE_NAME),
        }
    }

    /// Store in the platform config directory (e.g.
    /// `~/.config/browserstash` on Linux).
    pub fn default_location() -> Self {
        let dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("browserstash");
        Self {
            path: dir.join(CONFIG_FILE_NAME),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted configuration, or `None` if none was saved yet.
    pub fn load(&self) -> Result<Option<SyncConfig>, ConfigError> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no persisted configuration");
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&self.path)?;
        let config: SyncConfig = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "configuration loaded");
        Ok(Some(config))
    }

    /// Load the persisted configuration, falling back to defaults when no
    /// file exists or the stored value is unreadable.
    pub fn load_or_default(&self) -> SyncConfig {
        match self.load() {
            Ok(Some(config)) => config,
            Ok(None) => SyncConfig::default(),
            Err(e) => {
                warn!(error = %e, "failed to load configuration, using defaults");
                SyncConfig::default()
            }
        }
    }

    /// Persist the whole configuration, replacing any previous value.
    pub fn save(&self, config: &SyncConfig) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(config)?;
        std::fs::write(&self.path, contents)?;
        info!(path = %self.path.display(), "configuration saved");
        Ok(())
    }
}
