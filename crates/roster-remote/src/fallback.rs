use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use roster_types::Document;
use tracing::{debug, instrument};

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{RemoteKind, RemoteStore};

/// Plain request/response JSON endpoint.
///
/// `GET` returns the whole document, `POST` replaces it. There is no
/// versioning, so concurrent writers simply overwrite each other.
pub struct FallbackClient {
    http: Client,
    endpoint: String,
}

impl FallbackClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> RemoteResult<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RemoteError::Unavailable(format!("http client: {e}")))?;
        Ok(Self {
            http,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl RemoteStore for FallbackClient {
    fn kind(&self) -> RemoteKind {
        RemoteKind::Fallback
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn read(&self) -> RemoteResult<Document> {
        let response = self.http.get(&self.endpoint).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(RemoteError::NotFound);
        }
        if !status.is_success() {
            return Err(RemoteError::Unavailable(format!("fallback answered {status}")));
        }
        let bytes = response.bytes().await?;
        let doc = Document::from_json(&bytes)
            .map_err(|e| RemoteError::Decode(format!("fallback payload: {e}")))?;
        debug!(accounts = doc.len(), "fallback read");
        Ok(doc)
    }

    #[instrument(skip(self, doc), fields(endpoint = %self.endpoint))]
    async fn write(&self, doc: &Document) -> RemoteResult<()> {
        let response = self.http.post(&self.endpoint).json(doc).send().await?;
        let status = response.status();
        if status.is_success() {
            debug!(accounts = doc.len(), "fallback write");
            Ok(())
        } else if status == StatusCode::CONFLICT {
            Err(RemoteError::Conflict(format!("fallback answered {status}")))
        } else {
            Err(RemoteError::Unavailable(format!("fallback answered {status}")))
        }
    }
}

impl std::fmt::Debug for FallbackClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FallbackClient")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}
