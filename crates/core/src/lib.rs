//! BrowserStash core library.
//!
//! This crate provides the components for backing up browser state to a
//! remote store: configuration and its persistence, the snapshot model,
//! the storage provider abstraction (Gist and WebDAV backends), advisory
//! browsing insights, and the sync engine that orchestrates them.

pub mod browser;
pub mod config;
pub mod errors;
pub mod insights;
pub mod models;
pub mod provider;
pub mod sync_engine;

// Re-exports for convenience.
pub use config::{ConfigStore, ProviderKind, SyncConfig};
pub use models::Snapshot;
pub use sync_engine::SyncEngine;
