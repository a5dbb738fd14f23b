//! Blob storage for counterparty documents.
//!
//! Only deletion is needed here: uploads go straight from the browser to the
//! store, and the service removes documents that are no longer referenced.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use url::Url;

use crate::config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum BlobError {
    #[error("invalid document URL: {0}")]
    InvalidUrl(String),
    #[error("document {0} is not held by the configured blob store")]
    NotManaged(String),
    #[error("blob store request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("blob store responded with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn delete(&self, document_url: &str) -> Result<(), BlobError>;
}

/// Blob store reached over HTTP with an optional bearer token.
#[derive(Debug, Clone)]
pub struct HttpBlobStore {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpBlobStore {
    pub fn new(mut base_url: Url, token: Option<String>) -> Result<Self, BlobError> {
        // A base of `/documents` must not also cover `/documents-old/...`
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    /// Whether `target` names a document under the base URL.
    fn owns(&self, target: &Url) -> bool {
        target.origin() == self.base_url.origin()
            && target
                .path()
                .strip_prefix(self.base_url.path())
                .is_some_and(|rest| !rest.is_empty())
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn delete(&self, document_url: &str) -> Result<(), BlobError> {
        let target =
            Url::parse(document_url).map_err(|_| BlobError::InvalidUrl(document_url.to_string()))?;
        if !self.owns(&target) {
            return Err(BlobError::NotManaged(document_url.to_string()));
        }

        let mut request = self.client.delete(target);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        match response.status() {
            status if status.is_success() => Ok(()),
            // Already gone is as good as deleted
            StatusCode::NOT_FOUND => {
                tracing::debug!(document_url, "Document was already absent from blob store");
                Ok(())
            }
            status => Err(BlobError::Status(status.as_u16())),
        }
    }
}

/// Blob store used when none is configured. Deletions are logged and dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopBlobStore;

#[async_trait]
impl BlobStore for NoopBlobStore {
    async fn delete(&self, document_url: &str) -> Result<(), BlobError> {
        tracing::debug!(document_url, "No blob store configured; skipping document deletion");
        Ok(())
    }
}

/// Pick the blob store for the configuration.
pub fn from_config(config: &AppConfig) -> Result<std::sync::Arc<dyn BlobStore>, BlobError> {
    match config.blob_store_url.as_deref() {
        Some(raw) => {
            let base_url = Url::parse(raw).map_err(|_| BlobError::InvalidUrl(raw.to_string()))?;
            Ok(std::sync::Arc::new(HttpBlobStore::new(
                base_url,
                config.blob_store_token.clone(),
            )?))
        }
        None => Ok(std::sync::Arc::new(NoopBlobStore)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> HttpBlobStore {
        let base = Url::parse(&format!("{}/documents/", server.uri())).unwrap();
        HttpBlobStore::new(base, Some("blob-token".to_string())).unwrap()
    }

    #[tokio::test]
    async fn deletes_with_bearer_token() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/msc.pdf"))
            .and(header("authorization", "Bearer blob-token"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        store
            .delete(&format!("{}/documents/msc.pdf", server.uri()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn missing_document_counts_as_deleted() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        assert!(store
            .delete(&format!("{}/documents/gone.pdf", server.uri()))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn server_errors_are_reported() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let store = store_for(&server).await;
        let err = store
            .delete(&format!("{}/documents/a.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::Status(503)));
    }

    #[tokio::test]
    async fn refuses_foreign_urls() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        let err = store.delete("https://elsewhere.example/documents/a.pdf").await.unwrap_err();
        assert!(matches!(err, BlobError::NotManaged(_)));

        let err = store.delete("not a url").await.unwrap_err();
        assert!(matches!(err, BlobError::InvalidUrl(_)));
    }

    #[tokio::test]
    async fn base_without_trailing_slash_excludes_sibling_paths() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/documents/msc.pdf"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&format!("{}/documents", server.uri())).unwrap();
        let store = HttpBlobStore::new(base, None).unwrap();

        let err = store
            .delete(&format!("{}/documents-old/msc.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::NotManaged(_)));

        let err = store
            .delete(&format!("{}/documents/", server.uri()))
            .await
            .unwrap_err();
        assert!(matches!(err, BlobError::NotManaged(_)));

        store
            .delete(&format!("{}/documents/msc.pdf", server.uri()))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn noop_store_accepts_everything() {
        assert!(NoopBlobStore.delete("https://anywhere/x.pdf").await.is_ok());
    }
}
