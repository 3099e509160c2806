//! Storage provider abstraction.
//!
//! A provider is a stateless strategy object exposing `upload` and
//! `download`. [`create_provider`] maps the configured [`ProviderKind`] to
//! a fresh backend instance; since backends carry no state, it is safe to
//! call once per operation.

pub mod gist;
pub mod webdav;

use async_trait::async_trait;

use crate::config::{ProviderKind, SyncConfig};
use crate::errors::ProviderError;
use crate::models::Snapshot;

/// Fixed name of the remote snapshot entry, shared by both backends.
pub const SNAPSHOT_FILE_NAME: &str = "sync_data.json";

/// Capability contract implemented by every storage backend.
#[async_trait]
pub trait SyncProvider: Send + Sync {
    /// Which backend this is.
    fn kind(&self) -> ProviderKind;

    /// Upload a snapshot. Returns the backend-assigned remote identifier
    /// when the storage location is not derivable from configuration (the
    /// Gist backend); `None` otherwise.
    async fn upload(
        &self,
        config: &SyncConfig,
        snapshot: &Snapshot,
    ) -> Result<Option<String>, ProviderError>;

    /// Fetch and decode the remote snapshot. The result is handed back to
    /// the caller as-is; applying it to local browser state is a separate
    /// step that does not live here.
    async fn download(&self, config: &SyncConfig) -> Result<Snapshot, ProviderError>;
}

/// Construct the backend for the given provider kind.
pub fn create_provider(kind: ProviderKind) -> Box<dyn SyncProvider> {
    match kind {
        ProviderKind::Gist => Box::new(gist::GistProvider::new()),
        ProviderKind::Webdav => Box::new(webdav::WebdavProvider::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_returns_matching_backend() {
        assert_eq!(
            create_provider(ProviderKind::Gist).kind(),
            ProviderKind::Gist
        );
        assert_eq!(
            create_provider(ProviderKind::Webdav).kind(),
            ProviderKind::Webdav
        );
    }
}
