//! WebDAV-backed storage provider.
//!
//! The snapshot lives at a single fixed path under the configured base
//! URL. Uploads are whole-file PUTs (always a full overwrite, never a
//! partial update), downloads whole-file GETs; every request carries a
//! Basic-Auth header derived from the configured username and password.
//! Single attempt per call, no retry.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{debug, info, instrument};

use super::{SyncProvider, SNAPSHOT_FILE_NAME};
use crate::config::{ProviderKind, SyncConfig};
use crate::errors::ProviderError;
use crate::models::Snapshot;

/// WebDAV storage backend.
pub struct WebdavProvider {
    http: reqwest::Client,
}

impl WebdavProvider {
    pub fn new() -> Self {
        Self {
            http: reqwest::Client::new(),
        }
    }

    /// Resolve the fixed snapshot URL under the configured base endpoint.
    fn file_url(config: &SyncConfig) -> Result<String, ProviderError> {
        let base = config
            .webdav_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or(ProviderError::MissingCredential { field: "webdavUrl" })?;
        Ok(join_url(base, SNAPSHOT_FILE_NAME))
    }

    /// `Basic base64(user:pass)` from the configured credentials; absent
    /// fields degrade to empty strings.
    fn auth_header(config: &SyncConfig) -> String {
        let user = config.webdav_user.as_deref().unwrap_or_default();
        let pass = config.webdav_pass.as_deref().unwrap_or_default();
        format!("Basic {}", BASE64.encode(format!("{}:{}", user, pass)))
    }

    fn check_status(resp: &reqwest::Response) -> Result<(), ProviderError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        Err(ProviderError::Api {
            status: status.as_u16(),
            message: format!(
                "HTTP {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("request failed")
            ),
        })
    }
}

impl Default for WebdavProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Join a base URL and a file name, inserting a separator only when the
/// base lacks a trailing one.
fn join_url(base: &str, name: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, name)
    } else {
        format!("{}/{}", base, name)
    }
}

#[async_trait]
impl SyncProvider for WebdavProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Webdav
    }

    #[instrument(skip(self, config, snapshot))]
    async fn upload(
        &self,
        config: &SyncConfig,
        snapshot: &Snapshot,
    ) -> Result<Option<String>, ProviderError> {
        let url = Self::file_url(config)?;
        let body = serde_json::to_vec(snapshot)?;

        let resp = self
            .http
            .put(&url)
            .header(AUTHORIZATION, Self::auth_header(config))
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await?;
        Self::check_status(&resp)?;

        info!(url = %url, "snapshot uploaded via WebDAV");
        Ok(None)
    }

    #[instrument(skip(self, config))]
    async fn download(&self, config: &SyncConfig) -> Result<Snapshot, ProviderError> {
        let url = Self::file_url(config)?;

        let resp = self
            .http
            .get(&url)
            .header(AUTHORIZATION, Self::auth_header(config))
            .send()
            .await?;
        Self::check_status(&resp)?;

        let snapshot: Snapshot = resp.json().await?;
        debug!(last_updated = %snapshot.last_updated, "snapshot downloaded via WebDAV");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn webdav_config(base: &str) -> SyncConfig {
        SyncConfig {
            provider: ProviderKind::Webdav,
            webdav_url: Some(base.into()),
            webdav_user: Some("alice".into()),
            webdav_pass: Some("secret".into()),
            ..SyncConfig::default()
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            last_updated: "2025-06-01T12:00:00+00:00".into(),
            version: "1.0.0".into(),
            bookmarks: vec![json!({"title": "docs", "url": "https://docs.rs"})],
            extensions: vec![],
            history: vec![json!({"title": "crates", "url": "https://crates.io"})],
        }
    }

    #[test]
    fn test_join_url_without_trailing_slash() {
        assert_eq!(
            join_url("https://dav.example.com/backup", "sync_data.json"),
            "https://dav.example.com/backup/sync_data.json"
        );
    }

    #[test]
    fn test_join_url_with_trailing_slash() {
        assert_eq!(
            join_url("https://dav.example.com/backup/", "sync_data.json"),
            "https://dav.example.com/backup/sync_data.json"
        );
    }

    #[test]
    fn test_auth_header_encodes_user_and_password() {
        let config = webdav_config("https://dav.example.com");
        // base64("alice:secret")
        assert_eq!(
            WebdavProvider::auth_header(&config),
            "Basic YWxpY2U6c2VjcmV0"
        );
    }

    #[test]
    fn test_auth_header_with_absent_credentials() {
        let config = SyncConfig {
            provider: ProviderKind::Webdav,
            webdav_url: Some("https://dav.example.com".into()),
            ..SyncConfig::default()
        };
        // base64(":")
        assert_eq!(WebdavProvider::auth_header(&config), "Basic Og==");
    }

    #[tokio::test]
    async fn test_upload_without_url_makes_no_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PUT", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let config = SyncConfig {
            provider: ProviderKind::Webdav,
            ..SyncConfig::default()
        };
        let err = WebdavProvider::new()
            .upload(&config, &sample_snapshot())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::MissingCredential { field: "webdavUrl" }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_without_url_makes_no_network_call() {
        let config = SyncConfig {
            provider: ProviderKind::Webdav,
            ..SyncConfig::default()
        };
        let err = WebdavProvider::new().download(&config).await.unwrap_err();
        assert!(matches!(
            err,
            ProviderError::MissingCredential { field: "webdavUrl" }
        ));
    }

    #[tokio::test]
    async fn test_upload_overwrites_with_identical_content() {
        let snapshot = sample_snapshot();
        let expected_body = String::from_utf8(serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let mut server = mockito::Server::new_async().await;
        let put = server
            .mock("PUT", "/backup/sync_data.json")
            .match_header("authorization", "Basic YWxpY2U6c2VjcmV0")
            .match_body(mockito::Matcher::Exact(expected_body))
            .with_status(201)
            .expect(2)
            .create_async()
            .await;

        let config = webdav_config(&format!("{}/backup", server.url()));
        let provider = WebdavProvider::new();

        assert_eq!(provider.upload(&config, &snapshot).await.unwrap(), None);
        assert_eq!(provider.upload(&config, &snapshot).await.unwrap(), None);
        put.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_parses_snapshot() {
        let snapshot = sample_snapshot();

        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backup/sync_data.json")
            .with_status(200)
            .with_body(serde_json::to_string(&snapshot).unwrap())
            .create_async()
            .await;

        let config = webdav_config(&format!("{}/backup/", server.url()));
        let downloaded = WebdavProvider::new().download(&config).await.unwrap();
        assert_eq!(downloaded, snapshot);
    }

    #[tokio::test]
    async fn test_download_missing_file_embeds_status_text() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/backup/sync_data.json")
            .with_status(404)
            .create_async()
            .await;

        let config = webdav_config(&format!("{}/backup", server.url()));
        let err = WebdavProvider::new().download(&config).await.unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "HTTP 404 Not Found");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
