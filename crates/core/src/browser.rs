//! Browser-data accessors.
//!
//! The engine consumes bookmarks, installed extensions, and history through
//! the [`BrowserData`] trait; the real accessors live in the host browser.
//! [`PlaceholderBrowser`] stands in when no host environment is attached
//! and resolves each collection with a single illustrative record instead
//! of failing.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::errors::BrowserDataError;

/// Read access to the browser state collections.
///
/// Each method resolves with a provider-shaped list of records; the engine
/// treats the record contents as opaque.
#[async_trait]
pub trait BrowserData: Send + Sync {
    async fn bookmarks(&self) -> Result<Vec<Value>, BrowserDataError>;

    async fn extensions(&self) -> Result<Vec<Value>, BrowserDataError>;

    /// Most recent history entries, newest first. `max_results` caps the
    /// count when the host supports it.
    async fn history(&self, max_results: Option<u32>) -> Result<Vec<Value>, BrowserDataError>;
}

/// Accessor used when no browser host is attached.
#[derive(Debug, Default)]
pub struct PlaceholderBrowser;

#[async_trait]
impl BrowserData for PlaceholderBrowser {
    async fn bookmarks(&self) -> Result<Vec<Value>, BrowserDataError> {
        Ok(vec![json!({
            "id": "0",
            "title": "Example bookmark",
            "url": "https://example.com",
        })])
    }

    async fn extensions(&self) -> Result<Vec<Value>, BrowserDataError> {
        Ok(vec![json!({
            "id": "placeholder-extension",
            "name": "Example extension",
            "enabled": true,
        })])
    }

    async fn history(&self, _max_results: Option<u32>) -> Result<Vec<Value>, BrowserDataError> {
        Ok(vec![json!({
            "title": "Example page",
            "url": "https://example.com/page",
            "visitCount": 1,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_placeholder_returns_one_record_per_collection() {
        let browser = PlaceholderBrowser;

        let bookmarks = browser.bookmarks().await.unwrap();
        let extensions = browser.extensions().await.unwrap();
        let history = browser.history(None).await.unwrap();

        assert_eq!(bookmarks.len(), 1);
        assert_eq!(extensions.len(), 1);
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_placeholder_history_record_shape() {
        let browser = PlaceholderBrowser;
        let history = browser.history(Some(10)).await.unwrap();

        let record = &history[0];
        assert!(record.get("title").is_some());
        assert!(record.get("url").is_some());
    }
}
