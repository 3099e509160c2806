//! Domain model types: the snapshot envelope, the user-visible sync log,
//! and the status summary.

use std::collections::VecDeque;

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::ProviderKind;

/// Format version stamped into every snapshot. Not yet used to branch
/// decoding logic.
pub const SNAPSHOT_VERSION: &str = "1.0.0";

/// Maximum number of entries retained in the sync log.
pub const MAX_LOG_ENTRIES: usize = 50;

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// The versioned bundle of browser state transferred to and from remote
/// storage.
///
/// A disabled collection is encoded as an empty array, never omitted, so
/// decoders can rely on every field being present. Snapshots are built
/// fresh for each upload and never mutated afterwards; a downloaded
/// snapshot is returned to the caller and not applied to local state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// RFC 3339 timestamp set when the snapshot was built for upload.
    pub last_updated: String,
    pub version: String,
    pub bookmarks: Vec<Value>,
    pub extensions: Vec<Value>,
    pub history: Vec<Value>,
}

impl Snapshot {
    /// Build a snapshot from the gathered collections, stamped with the
    /// current time and the fixed format version.
    pub fn new(bookmarks: Vec<Value>, extensions: Vec<Value>, history: Vec<Value>) -> Self {
        Self {
            last_updated: chrono::Utc::now().to_rfc3339(),
            version: SNAPSHOT_VERSION.to_string(),
            bookmarks,
            extensions,
            history,
        }
    }
}

// ---------------------------------------------------------------------------
// Sync log
// ---------------------------------------------------------------------------

/// Severity of a sync log entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Error,
    Success,
}

impl std::fmt::Display for LogKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Error => write!(f, "error"),
            Self::Success => write!(f, "success"),
        }
    }
}

/// A single user-visible sync log line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncLogEntry {
    /// Local wall-clock time the entry was recorded.
    pub timestamp: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
}

/// Bounded ring buffer of sync log entries, newest first.
#[derive(Debug, Default)]
pub struct SyncLog {
    entries: VecDeque<SyncLogEntry>,
}

impl SyncLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend an entry, evicting the oldest once capacity is reached.
    pub fn push(&mut self, kind: LogKind, message: impl Into<String>) {
        self.entries.push_front(SyncLogEntry {
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            kind,
            message: message.into(),
        });
        self.entries.truncate(MAX_LOG_ENTRIES);
    }

    /// Entries, newest first.
    pub fn entries(&self) -> Vec<SyncLogEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Status summary
// ---------------------------------------------------------------------------

/// High-level engine status summary for the UI layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub provider: ProviderKind,
    pub busy: bool,
    /// Local display time of the last successful upload, if any.
    pub last_sync: Option<String>,
    pub sync_bookmarks: bool,
    pub sync_extensions: bool,
    pub sync_history: bool,
}
