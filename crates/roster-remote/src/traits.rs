use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use roster_types::{Document, VersionToken};

use crate::error::RemoteResult;

/// Which kind of remote a [`RemoteStore`] talks to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RemoteKind {
    BlobStore,
    Fallback,
}

impl fmt::Display for RemoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BlobStore => f.write_str("blob-store"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// A remote home for the whole shared document.
///
/// `read` reports a missing document as [`RemoteError::NotFound`]; callers
/// decide whether that is an error. `write` always replaces the full
/// document.
///
/// [`RemoteError::NotFound`]: crate::RemoteError::NotFound
#[async_trait]
pub trait RemoteStore: Send + Sync {
    fn kind(&self) -> RemoteKind;
    async fn read(&self) -> RemoteResult<Document>;
    async fn write(&self, doc: &Document) -> RemoteResult<()>;
}

#[async_trait]
impl<R: RemoteStore + ?Sized> RemoteStore for Arc<R> {
    fn kind(&self) -> RemoteKind {
        (**self).kind()
    }

    async fn read(&self) -> RemoteResult<Document> {
        (**self).read().await
    }

    async fn write(&self, doc: &Document) -> RemoteResult<()> {
        (**self).write(doc).await
    }
}

/// Raw blob contents together with the token identifying that revision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VersionedBlob {
    pub content: Vec<u8>,
    pub token: VersionToken,
}

/// Wire side of a versioned object store holding one blob.
///
/// `put` must fail with [`RemoteError::Conflict`] when `expected` does not
/// match the stored revision (`None` expects the blob to be absent).
///
/// [`RemoteError::Conflict`]: crate::RemoteError::Conflict
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Fetch the blob, or `None` if it does not exist.
    async fn get(&self) -> RemoteResult<Option<VersionedBlob>>;

    /// Store new contents. Returns the new revision's token when the
    /// backend reports one.
    async fn put(
        &self,
        content: &[u8],
        expected: Option<&VersionToken>,
    ) -> RemoteResult<Option<VersionToken>>;

    /// Token of the current revision.
    ///
    /// Default implementation fetches the whole blob.
    async fn current_token(&self) -> RemoteResult<Option<VersionToken>> {
        Ok(self.get().await?.map(|blob| blob.token))
    }
}

#[async_trait]
impl<B: BlobBackend + ?Sized> BlobBackend for Arc<B> {
    async fn get(&self) -> RemoteResult<Option<VersionedBlob>> {
        (**self).get().await
    }

    async fn put(
        &self,
        content: &[u8],
        expected: Option<&VersionToken>,
    ) -> RemoteResult<Option<VersionToken>> {
        (**self).put(content, expected).await
    }

    async fn current_token(&self) -> RemoteResult<Option<VersionToken>> {
        (**self).current_token().await
    }
}
