use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;
use roster_types::VersionToken;
use tracing::debug;

use crate::error::{RemoteError, RemoteResult};
use crate::traits::{BlobBackend, VersionedBlob};

/// In-process versioned blob store.
///
/// Revisions are tagged with the BLAKE3 hash of their contents. The store can
/// be switched offline to simulate an unreachable remote, and counts traffic
/// so callers can observe how often it was hit.
pub struct InMemoryBlobs {
    blob: RwLock<Option<VersionedBlob>>,
    online: AtomicBool,
    gets: AtomicUsize,
    puts: AtomicUsize,
}

impl InMemoryBlobs {
    pub fn new() -> Self {
        Self {
            blob: RwLock::new(None),
            online: AtomicBool::new(true),
            gets: AtomicUsize::new(0),
            puts: AtomicUsize::new(0),
        }
    }

    /// Toggle reachability. While offline every call fails with
    /// [`RemoteError::Unavailable`].
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Overwrite the blob without any version check, as another writer
    /// would. Returns the new token.
    pub fn overwrite(&self, content: &[u8]) -> VersionToken {
        let token = VersionToken::of_content(content);
        *self.blob.write().expect("lock poisoned") = Some(VersionedBlob {
            content: content.to_vec(),
            token: token.clone(),
        });
        token
    }

    /// Current contents, bypassing counters and the online switch.
    pub fn contents(&self) -> Option<Vec<u8>> {
        self.blob
            .read()
            .expect("lock poisoned")
            .as_ref()
            .map(|b| b.content.clone())
    }

    /// Number of `get` calls served.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `put` calls accepted.
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn ensure_online(&self) -> RemoteResult<()> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(RemoteError::Unavailable("in-memory blob store is offline".into()))
        }
    }
}

impl Default for InMemoryBlobs {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BlobBackend for InMemoryBlobs {
    async fn get(&self) -> RemoteResult<Option<VersionedBlob>> {
        self.ensure_online()?;
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.blob.read().expect("lock poisoned").clone())
    }

    async fn put(
        &self,
        content: &[u8],
        expected: Option<&VersionToken>,
    ) -> RemoteResult<Option<VersionToken>> {
        self.ensure_online()?;
        let mut slot = self.blob.write().expect("lock poisoned");
        let current = slot.as_ref().map(|b| &b.token);
        if current != expected {
            return Err(RemoteError::Conflict(format!(
                "expected {:?}, store is at {:?}",
                expected, current
            )));
        }
        let token = VersionToken::of_content(content);
        debug!(token = token.short(), bytes = content.len(), "in-memory blob stored");
        *slot = Some(VersionedBlob {
            content: content.to_vec(),
            token: token.clone(),
        });
        self.puts.fetch_add(1, Ordering::SeqCst);
        Ok(Some(token))
    }
}

impl std::fmt::Debug for InMemoryBlobs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobs")
            .field("online", &self.online.load(Ordering::SeqCst))
            .field("gets", &self.gets())
            .field("puts", &self.puts())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn starts_empty() {
        let blobs = InMemoryBlobs::new();
        assert_eq!(blobs.get().await.unwrap(), None);
        assert_eq!(blobs.gets(), 1);
    }

    #[tokio::test]
    async fn create_requires_absent_token() {
        let blobs = InMemoryBlobs::new();
        let stale = VersionToken::new("nope");
        let err = blobs.put(b"{}", Some(&stale)).await.unwrap_err();
        assert!(err.is_conflict());

        let token = blobs.put(b"{}", None).await.unwrap().unwrap();
        assert_eq!(token, VersionToken::of_content(b"{}"));
        assert_eq!(blobs.puts(), 1);
    }

    #[tokio::test]
    async fn update_with_current_token_succeeds() {
        let blobs = InMemoryBlobs::new();
        let t1 = blobs.put(b"1", None).await.unwrap().unwrap();
        let t2 = blobs.put(b"2", Some(&t1)).await.unwrap().unwrap();
        assert_ne!(t1, t2);
        assert_eq!(blobs.contents().unwrap(), b"2");
    }

    #[tokio::test]
    async fn stale_token_conflicts_after_overwrite() {
        let blobs = InMemoryBlobs::new();
        let t1 = blobs.put(b"1", None).await.unwrap().unwrap();
        blobs.overwrite(b"rival");
        let err = blobs.put(b"mine", Some(&t1)).await.unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(blobs.contents().unwrap(), b"rival");
    }

    #[tokio::test]
    async fn offline_fails_everything() {
        let blobs = InMemoryBlobs::new();
        blobs.set_online(false);
        assert!(matches!(blobs.get().await, Err(RemoteError::Unavailable(_))));
        assert!(matches!(blobs.put(b"x", None).await, Err(RemoteError::Unavailable(_))));
        blobs.set_online(true);
        assert!(blobs.get().await.is_ok());
    }

    #[tokio::test]
    async fn current_token_tracks_latest_revision() {
        let blobs = InMemoryBlobs::new();
        assert_eq!(blobs.current_token().await.unwrap(), None);
        let t = blobs.overwrite(b"x");
        assert_eq!(blobs.current_token().await.unwrap(), Some(t));
    }
}
