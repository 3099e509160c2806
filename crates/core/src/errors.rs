//! Error types for the BrowserStash core library.
//!
//! Each subsystem has its own error type derived with `thiserror`, and a
//! top-level [`CoreError`] enum unifies them all for callers that want a
//! single error type.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Unified error type for the entire core library.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Browser(#[from] BrowserDataError),

    #[error(transparent)]
    Insight(#[from] InsightError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

// ---------------------------------------------------------------------------
// Provider errors
// ---------------------------------------------------------------------------

/// Errors from storage provider operations (Gist, WebDAV).
#[derive(Debug, Error)]
pub enum ProviderError {
    /// A required credential or endpoint is not configured. Raised locally,
    /// before any network call is attempted.
    #[error("{field} is not configured")]
    MissingCredential { field: &'static str },

    /// Download requires a remote snapshot identifier that no upload has
    /// assigned yet.
    #[error("no remote snapshot id configured; upload first")]
    MissingRemoteId,

    /// HTTP-level transport error (network, TLS, etc.).
    #[error("provider HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The remote returned a non-success status code.
    #[error("provider error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The remote payload was missing the expected entry or was empty.
    #[error("snapshot not found: {reason}")]
    Decode { reason: String },

    /// Snapshot JSON could not be encoded or parsed.
    #[error("snapshot JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The configured provider identifier has no implementation.
    #[error("provider not implemented: {0}")]
    NotImplemented(String),
}

impl ProviderError {
    /// Whether this error was raised locally, before any network call.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential { .. } | Self::MissingRemoteId | Self::NotImplemented(_)
        )
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The stored configuration could not be parsed.
    #[error("configuration parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Generic I/O error reading or writing the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Browser-data errors
// ---------------------------------------------------------------------------

/// Errors from the browser-data accessors.
#[derive(Debug, Error)]
pub enum BrowserDataError {
    /// The host environment rejected or failed the enumeration call.
    #[error("browser data access failed: {reason}")]
    AccessFailed { reason: String },
}

// ---------------------------------------------------------------------------
// Insight errors
// ---------------------------------------------------------------------------

/// Errors from the advisory insight analyzer. These never surface to the
/// sync caller; the engine logs and swallows them.
#[derive(Debug, Error)]
pub enum InsightError {
    #[error("insight analysis failed: {reason}")]
    AnalysisFailed { reason: String },
}

// ---------------------------------------------------------------------------
// Sync engine errors
// ---------------------------------------------------------------------------

/// Errors raised inside a sync operation before the engine converts them
/// into user-visible log entries at its boundary.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Browser(#[from] BrowserDataError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}
