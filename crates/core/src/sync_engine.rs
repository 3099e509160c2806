//! Browser-state synchronization orchestrator.
//!
//! The [`SyncEngine`] composes the browser-data accessors, the snapshot
//! model, and a storage provider to perform a full upload or download:
//!
//! 1. Guard against a concurrent operation with the busy flag.
//! 2. Gather the enabled data collections (upload) or fetch the remote
//!    snapshot (download).
//! 3. Call the provider resolved from the configured backend.
//! 4. Persist any backend-assigned remote identifier back into config.
//! 5. Record the outcome in the user-visible sync log.
//!
//! Errors from accessors and providers are converted into log entries at
//! this boundary; callers observe outcomes and state, never exceptions.
//! After a successful upload, a detached task derives advisory browsing
//! insights from the history collection; its failure or latency cannot
//! affect the sync outcome.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::Local;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::browser::BrowserData;
use crate::config::{ConfigStore, ProviderKind, SyncConfig};
use crate::errors::{ConfigError, SyncError};
use crate::insights::{digest_history, InsightAnalyzer, SyncInsights};
use crate::models::{LogKind, Snapshot, SyncLog, SyncLogEntry, SyncStatus};
use crate::provider::{self, SyncProvider};

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Outcome of an upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// The snapshot was uploaded and the log updated.
    Completed,
    /// The operation failed; the reason is in the sync log.
    Failed,
    /// Another operation was in flight; nothing was done.
    AlreadyBusy,
}

/// Outcome of a download request. A fetched snapshot is returned to the
/// caller and deliberately not applied to local browser state.
#[derive(Debug, Clone, PartialEq)]
pub enum DownloadOutcome {
    Completed(Snapshot),
    Failed,
    AlreadyBusy,
}

/// Resolves a provider instance per operation.
pub type ProviderFactory = Box<dyn Fn(ProviderKind) -> Box<dyn SyncProvider> + Send + Sync>;

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// The synchronization engine.
pub struct SyncEngine {
    store: ConfigStore,
    config: RwLock<SyncConfig>,
    browser: Arc<dyn BrowserData>,
    analyzer: Option<Arc<dyn InsightAnalyzer>>,
    factory: ProviderFactory,
    /// Advisory flag preventing a second upload/download while one is in
    /// flight. Re-entrant calls are no-ops, not queued.
    busy: AtomicBool,
    log: Mutex<SyncLog>,
    last_sync: Mutex<Option<String>>,
    insights_tx: Arc<watch::Sender<Option<SyncInsights>>>,
}

impl SyncEngine {
    /// Create an engine with the stock provider factory. The configuration
    /// is read once from the store; later mutations are written back
    /// immediately.
    pub fn new(
        store: ConfigStore,
        browser: Arc<dyn BrowserData>,
        analyzer: Option<Arc<dyn InsightAnalyzer>>,
    ) -> Self {
        Self::with_provider_factory(store, browser, analyzer, Box::new(provider::create_provider))
    }

    /// Create an engine resolving providers through a custom factory.
    pub fn with_provider_factory(
        store: ConfigStore,
        browser: Arc<dyn BrowserData>,
        analyzer: Option<Arc<dyn InsightAnalyzer>>,
        factory: ProviderFactory,
    ) -> Self {
        let config = store.load_or_default();
        info!(provider = %config.provider, "initializing sync engine");

        let (insights_tx, _) = watch::channel(None);
        Self {
            store,
            config: RwLock::new(config),
            browser,
            analyzer,
            factory,
            busy: AtomicBool::new(false),
            log: Mutex::new(SyncLog::new()),
            last_sync: Mutex::new(None),
            insights_tx: Arc::new(insights_tx),
        }
    }

    // -----------------------------------------------------------------------
    // State accessors
    // -----------------------------------------------------------------------

    /// Current configuration value.
    pub fn config(&self) -> SyncConfig {
        self.config
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Replace the configuration wholesale and persist it immediately.
    pub fn set_config(&self, config: SyncConfig) -> Result<(), ConfigError> {
        self.store.save(&config)?;
        *self
            .config
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = config;
        Ok(())
    }

    /// Whether an upload or download is currently in flight.
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Sync log entries, newest first.
    pub fn log_entries(&self) -> Vec<SyncLogEntry> {
        self.log_guard().entries()
    }

    /// Local display time of the last successful upload, if any.
    pub fn last_sync(&self) -> Option<String> {
        self.last_sync
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Subscribe to advisory insight updates published after uploads.
    pub fn subscribe_insights(&self) -> watch::Receiver<Option<SyncInsights>> {
        self.insights_tx.subscribe()
    }

    /// Most recently published advisory insights, if any.
    pub fn latest_insights(&self) -> Option<SyncInsights> {
        self.insights_tx.borrow().clone()
    }

    /// Status summary for the UI layer.
    pub fn status(&self) -> SyncStatus {
        let config = self.config();
        SyncStatus {
            provider: config.provider,
            busy: self.is_busy(),
            last_sync: self.last_sync(),
            sync_bookmarks: config.sync_bookmarks,
            sync_extensions: config.sync_extensions,
            sync_history: config.sync_history,
        }
    }

    fn log_guard(&self) -> MutexGuard<'_, SyncLog> {
        self.log.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn append_log(&self, kind: LogKind, message: impl Into<String>) {
        self.log_guard().push(kind, message);
    }

    // -----------------------------------------------------------------------
    // Upload
    // -----------------------------------------------------------------------

    /// Gather the enabled collections, build a snapshot, and upload it
    /// through the configured provider.
    pub async fn perform_upload(&self) -> UploadOutcome {
        // Acquire the busy flag; a second request while busy is a no-op.
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("upload requested while another operation is in flight");
            return UploadOutcome::AlreadyBusy;
        }
        let _guard = BusyGuard(&self.busy);

        let config = self.config();

        // Credential pre-check: fail before gathering data or touching the
        // network.
        if let Some(field) = config.missing_credential() {
            self.append_log(
                LogKind::Error,
                format!("upload failed: {} is not configured", field),
            );
            return UploadOutcome::Failed;
        }

        self.append_log(
            LogKind::Info,
            format!("initiating upload to {}", config.provider),
        );

        match self.do_upload(&config).await {
            Ok(history) => {
                let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
                *self
                    .last_sync
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(now);
                self.append_log(LogKind::Success, "upload completed");
                self.spawn_insight_analysis(history);
                UploadOutcome::Completed
            }
            Err(e) => {
                warn!(error = %e, "upload failed");
                self.append_log(LogKind::Error, format!("upload failed: {}", e));
                UploadOutcome::Failed
            }
        }
    }

    async fn do_upload(&self, config: &SyncConfig) -> Result<Vec<Value>, SyncError> {
        // Disabled collections contribute an empty sequence; the field is
        // still present in the payload.
        let bookmarks = if config.sync_bookmarks {
            self.browser.bookmarks().await?
        } else {
            Vec::new()
        };
        let extensions = if config.sync_extensions {
            self.browser.extensions().await?
        } else {
            Vec::new()
        };
        let history = if config.sync_history {
            self.browser.history(None).await?
        } else {
            Vec::new()
        };

        debug!(
            bookmarks = bookmarks.len(),
            extensions = extensions.len(),
            history = history.len(),
            "collections gathered"
        );

        let snapshot = Snapshot::new(bookmarks, extensions, history.clone());

        let provider = (self.factory)(config.provider);
        let remote_id = provider.upload(config, &snapshot).await?;

        // Persist a newly assigned remote identifier for future updates.
        if let Some(id) = remote_id {
            if config.gist_id.as_deref() != Some(id.as_str()) {
                let mut updated = config.clone();
                updated.gist_id = Some(id.clone());
                self.store.save(&updated)?;
                *self
                    .config
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner()) = updated;
                info!(gist_id = %id, "stored new remote snapshot id");
            }
        }

        Ok(history)
    }

    /// Fire-and-forget trend analysis over the uploaded history. Failures
    /// are logged and swallowed; the sync outcome is already decided.
    fn spawn_insight_analysis(&self, history: Vec<Value>) {
        let Some(analyzer) = self.analyzer.clone() else {
            return;
        };
        if history.is_empty() {
            return;
        }

        let digests = digest_history(&history);
        let tx = Arc::clone(&self.insights_tx);
        tokio::spawn(async move {
            match analyzer.analyze(&digests).await {
                Ok(insights) => {
                    debug!(
                        recommendations = insights.recommendations.len(),
                        "advisory insights published"
                    );
                    let _ = tx.send(Some(insights));
                }
                Err(e) => warn!(error = %e, "insight analysis failed"),
            }
        });
    }

    // -----------------------------------------------------------------------
    // Download
    // -----------------------------------------------------------------------

    /// Fetch the remote snapshot through the configured provider. The
    /// snapshot is returned to the caller; restoring it into the browser is
    /// a deliberately separate step that is not wired up here.
    pub async fn perform_download(&self) -> DownloadOutcome {
        if self
            .busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("download requested while another operation is in flight");
            return DownloadOutcome::AlreadyBusy;
        }
        let _guard = BusyGuard(&self.busy);

        let config = self.config();
        self.append_log(
            LogKind::Info,
            format!("initiating download from {}", config.provider),
        );

        let provider = (self.factory)(config.provider);
        match provider.download(&config).await {
            Ok(snapshot) => {
                self.append_log(
                    LogKind::Success,
                    format!(
                        "downloaded snapshot (updated {}, version {})",
                        snapshot.last_updated, snapshot.version
                    ),
                );
                self.append_log(
                    LogKind::Info,
                    "snapshot not applied to local browser state; restore is a separate step",
                );
                DownloadOutcome::Completed(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "download failed");
                self.append_log(LogKind::Error, format!("download failed: {}", e));
                DownloadOutcome::Failed
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Busy flag RAII guard
// ---------------------------------------------------------------------------

/// Drop guard that returns the busy flag to idle on every exit path, even
/// if the operation panics.
struct BusyGuard<'a>(&'a AtomicBool);

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}
