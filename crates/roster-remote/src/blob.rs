use std::sync::Mutex;

use async_trait::async_trait;
use roster_types::{Document, VersionToken};
use tracing::{debug, warn};

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{BlobBackend, RemoteKind, RemoteStore};

/// Reads and writes the shared document as one JSON blob.
///
/// Writes are tagged with the blob's version token. The token is fetched
/// again right before each write instead of reusing the one from the last
/// read, so only a writer that lands between that fetch and the put can
/// cause a [`RemoteError::Conflict`]. Conflicts are reported, never merged.
pub struct BlobStoreClient<B> {
    backend: B,
    last_token: Mutex<Option<VersionToken>>,
}

impl<B: BlobBackend> BlobStoreClient<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            last_token: Mutex::new(None),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Token seen on the last successful read or write by this client.
    pub fn last_token(&self) -> Option<VersionToken> {
        self.last_token.lock().expect("token lock poisoned").clone()
    }

    fn remember(&self, token: Option<VersionToken>) {
        *self.last_token.lock().expect("token lock poisoned") = token;
    }
}

#[async_trait]
impl<B: BlobBackend> RemoteStore for BlobStoreClient<B> {
    fn kind(&self) -> RemoteKind {
        RemoteKind::BlobStore
    }

    async fn read(&self) -> RemoteResult<Document> {
        let blob = self.backend.get().await?.ok_or(RemoteError::NotFound)?;
        let doc = Document::from_json(&blob.content)
            .map_err(|e| RemoteError::Decode(format!("blob is not a roster document: {e}")))?;
        debug!(token = blob.token.short(), accounts = doc.len(), "blob read");
        self.remember(Some(blob.token));
        Ok(doc)
    }

    async fn write(&self, doc: &Document) -> RemoteResult<()> {
        let content = doc
            .to_json_pretty()
            .map_err(|e| RemoteError::Decode(format!("cannot encode document: {e}")))?;

        let current = self.backend.current_token().await?;
        let seen = self.last_token();
        if seen.is_some() && seen != current {
            debug!(
                seen = seen.as_ref().map(|t| t.short().to_string()),
                current = current.as_ref().map(|t| t.short().to_string()),
                "blob changed since this client last touched it"
            );
        }
        match self.backend.put(&content, current.as_ref()).await {
            Ok(next) => {
                debug!(
                    previous = current.as_ref().map(|t| t.short().to_string()),
                    bytes = content.len(),
                    "blob written"
                );
                self.remember(next);
                Ok(())
            }
            Err(e) => {
                if e.is_conflict() {
                    warn!(error = %e, "blob write lost a version race");
                }
                Err(e)
            }
        }
    }
}

impl<B> std::fmt::Debug for BlobStoreClient<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = self.last_token.lock().expect("token lock poisoned").clone();
        f.debug_struct("BlobStoreClient")
            .field("last_token", &token.as_ref().map(VersionToken::short))
            .finish_non_exhaustive()
    }
}
