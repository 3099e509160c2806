//! GitHub-Gist-backed storage provider.
//!
//! Snapshots are stored as a single fixed-name file inside a private gist.
//! The first upload creates the gist (POST); later uploads PATCH it in
//! place once an identifier is known. Single attempt per call, no retry.

use std::collections::HashMap;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde::Deserialize;
use tracing::{debug, info, instrument};

use super::{SyncProvider, SNAPSHOT_FILE_NAME};
use crate::config::{ProviderKind, SyncConfig};
use crate::errors::ProviderError;
use crate::models::Snapshot;

/// Default GitHub API endpoint.
pub const GITHUB_API_URL: &str = "https://api.github.com";

/// Description attached to the backing gist.
const GIST_DESCRIPTION: &str = "BrowserStash browser data backup";

#[derive(Debug, Deserialize)]
struct GistResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct GistDetail {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GistErrorBody {
    message: Option<String>,
}

/// Gist storage backend.
pub struct GistProvider {
    http: reqwest::Client,
    api_url: String,
}

impl GistProvider {
    /// Backend against the public GitHub API.
    pub fn new() -> Self {
        Self::with_api_url(GITHUB_API_URL)
    }

    /// Backend against a custom API endpoint (GitHub Enterprise, tests).
    pub fn with_api_url(api_url: impl Into<String>) -> Self {
        let api_url = api_url.into().trim_end_matches('/').to_string();
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static("browserstash/0.1"));
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .build()
            .expect("failed to build reqwest client");
        Self { http, api_url }
    }

    fn token<'a>(&self, config: &'a SyncConfig) -> Result<&'a str, ProviderError> {
        config
            .gist_token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or(ProviderError::MissingCredential { field: "gistToken" })
    }

    /// Pass a successful response through; otherwise surface the API's own
    /// error message when the body is parseable, else the status text.
    async fn check_response(resp: reqwest::Response) -> Result<reqwest::Response, ProviderError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }

        let fallback = status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string();
        let message = match resp.json::<GistErrorBody>().await {
            Ok(GistErrorBody { message: Some(m) }) if !m.is_empty() => m,
            _ => fallback,
        };

        Err(ProviderError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl Default for GistProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SyncProvider for GistProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Gist
    }

    #[instrument(skip(self, config, snapshot))]
    async fn upload(
        &self,
        config: &SyncConfig,
        snapshot: &Snapshot,
    ) -> Result<Option<String>, ProviderError> {
        let token = self.token(config)?;

        let content = serde_json::to_string_pretty(snapshot)?;
        let body = serde_json::json!({
            "description": GIST_DESCRIPTION,
            "public": false,
            "files": { SNAPSHOT_FILE_NAME: { "content": content } },
        });

        // Create on first upload, update in place once an id is known.
        let resp = match config.gist_id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => {
                let url = format!("{}/gists/{}", self.api_url, id);
                debug!(gist_id = id, "updating existing gist");
                self.http
                    .patch(&url)
                    .bearer_auth(token)
                    .json(&body)
                    .send()
                    .await?
            }
            None => {
                let url = format!("{}/gists", self.api_url);
                debug!("creating new gist");
                self.http
                    .post(&url)
                    .bearer_auth(token)
                    .json(&body)
                    .send()
                    .await?
            }
        };

        let resp = Self::check_response(resp).await?;
        let gist: GistResponse = resp.json().await?;
        info!(gist_id = %gist.id, "snapshot uploaded to gist");
        Ok(Some(gist.id))
    }

    #[instrument(skip(self, config))]
    async fn download(&self, config: &SyncConfig) -> Result<Snapshot, ProviderError> {
        let token = self.token(config)?;
        let id = config
            .gist_id
            .as_deref()
            .filter(|id| !id.trim().is_empty())
            .ok_or(ProviderError::MissingRemoteId)?;

        let url = format!("{}/gists/{}", self.api_url, id);
        let resp = self.http.get(&url).bearer_auth(token).send().await?;
        let resp = Self::check_response(resp).await?;

        let gist: GistDetail = resp.json().await?;
        let content = gist
            .files
            .get(SNAPSHOT_FILE_NAME)
            .and_then(|f| f.content.as_deref())
            .filter(|c| !c.is_empty())
            .ok_or_else(|| ProviderError::Decode {
                reason: format!("gist has no usable {} entry", SNAPSHOT_FILE_NAME),
            })?;

        let snapshot: Snapshot = serde_json::from_str(content)?;
        debug!(last_updated = %snapshot.last_updated, "snapshot downloaded from gist");
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gist_config(token: Option<&str>, id: Option<&str>) -> SyncConfig {
        SyncConfig {
            provider: ProviderKind::Gist,
            gist_token: token.map(Into::into),
            gist_id: id.map(Into::into),
            ..SyncConfig::default()
        }
    }

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            last_updated: "2025-06-01T12:00:00+00:00".into(),
            version: "1.0.0".into(),
            bookmarks: vec![json!({"title": "docs", "url": "https://docs.rs"})],
            extensions: vec![json!({"name": "dark-theme"})],
            history: vec![json!({"title": "crates", "url": "https://crates.io"})],
        }
    }

    #[tokio::test]
    async fn test_upload_without_token_makes_no_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/gists")
            .expect(0)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .upload(&gist_config(None, None), &sample_snapshot())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ProviderError::MissingCredential { field: "gistToken" }
        ));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_download_without_id_makes_no_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", mockito::Matcher::Any)
            .expect(0)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .download(&gist_config(Some("t"), None))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::MissingRemoteId));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_without_id_creates_gist() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/gists")
            .match_header("authorization", "Bearer t")
            .with_status(201)
            .with_body(r#"{"id": "abc"}"#)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let id = provider
            .upload(&gist_config(Some("t"), None), &sample_snapshot())
            .await
            .unwrap();

        assert_eq!(id.as_deref(), Some("abc"));
        create.assert_async().await;
    }

    #[tokio::test]
    async fn test_upload_with_id_patches_in_place() {
        let mut server = mockito::Server::new_async().await;
        let create = server
            .mock("POST", "/gists")
            .expect(0)
            .create_async()
            .await;
        let update = server
            .mock("PATCH", "/gists/abc")
            .with_status(200)
            .with_body(r#"{"id": "abc"}"#)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let id = provider
            .upload(&gist_config(Some("t"), Some("abc")), &sample_snapshot())
            .await
            .unwrap();

        assert_eq!(id.as_deref(), Some("abc"));
        create.assert_async().await;
        update.assert_async().await;
    }

    #[tokio::test]
    async fn test_wire_roundtrip_preserves_all_data_fields() {
        let original = sample_snapshot();
        let content = serde_json::to_string_pretty(&original).unwrap();
        let gist_body = serde_json::to_string(&json!({
            "id": "abc",
            "files": { SNAPSHOT_FILE_NAME: { "content": content } },
        }))
        .unwrap();

        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/gists/abc")
            .with_status(200)
            .with_body(gist_body)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let downloaded = provider
            .download(&gist_config(Some("t"), Some("abc")))
            .await
            .unwrap();

        assert_eq!(downloaded.last_updated, original.last_updated);
        assert_eq!(downloaded.bookmarks, original.bookmarks);
        assert_eq!(downloaded.extensions, original.extensions);
        assert_eq!(downloaded.history, original.history);
    }

    #[tokio::test]
    async fn test_download_with_missing_entry_fails_to_decode() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/gists/abc")
            .with_status(200)
            .with_body(r#"{"id": "abc", "files": {}}"#)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .download(&gist_config(Some("t"), Some("abc")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_download_with_empty_content_fails_to_decode() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/gists/abc")
            .with_status(200)
            .with_body(format!(
                r#"{{"id": "abc", "files": {{"{}": {{"content": ""}}}}}}"#,
                SNAPSHOT_FILE_NAME
            ))
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .download(&gist_config(Some("t"), Some("abc")))
            .await
            .unwrap_err();

        assert!(matches!(err, ProviderError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_api_error_message_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/gists")
            .with_status(401)
            .with_body(r#"{"message": "Bad credentials"}"#)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .upload(&gist_config(Some("bad"), None), &sample_snapshot())
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Bad credentials");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_api_error_without_body_falls_back_to_status_text() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/gists")
            .with_status(500)
            .create_async()
            .await;

        let provider = GistProvider::with_api_url(server.url());
        let err = provider
            .upload(&gist_config(Some("t"), None), &sample_snapshot())
            .await
            .unwrap_err();

        match err {
            ProviderError::Api { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "Internal Server Error");
            }
            other => panic!("expected Api error, got {:?}", other),
        }
    }
}
