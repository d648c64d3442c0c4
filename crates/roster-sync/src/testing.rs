//! Test doubles shared by this crate's unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use roster_remote::{
    BlobBackend, InMemoryBlobs, RemoteError, RemoteKind, RemoteResult, RemoteStore, VersionedBlob,
};
use roster_types::{Account, Document, VersionToken};
use tokio::time::Instant;

pub(crate) fn doc(passcode: &str, username: &str) -> Document {
    let mut d = Document::new();
    d.insert(passcode, Account::new(username));
    d
}

/// Unversioned remote with a scriptable failure, optional read latency and
/// call counters.
#[derive(Default)]
pub(crate) struct ScriptedRemote {
    doc: Mutex<Option<Document>>,
    failure: Mutex<Option<RemoteError>>,
    latency: Mutex<Option<Duration>>,
    read_starts: Mutex<Vec<Instant>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl ScriptedRemote {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn holding(doc: Document) -> Self {
        Self {
            doc: Mutex::new(Some(doc)),
            ..Self::default()
        }
    }

    /// Make every call fail with `error` until cleared with `None`.
    pub(crate) fn fail_with(&self, error: Option<RemoteError>) {
        *self.failure.lock().unwrap() = error;
    }

    /// Make every read take `latency` before answering.
    pub(crate) fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// When each read began, in order.
    pub(crate) fn read_starts(&self) -> Vec<Instant> {
        self.read_starts.lock().unwrap().clone()
    }

    pub(crate) fn current(&self) -> Option<Document> {
        self.doc.lock().unwrap().clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub(crate) fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self) -> RemoteResult<()> {
        match self.failure.lock().unwrap().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl RemoteStore for ScriptedRemote {
    fn kind(&self) -> RemoteKind {
        RemoteKind::Fallback
    }

    async fn read(&self) -> RemoteResult<Document> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.read_starts.lock().unwrap().push(Instant::now());
        let latency = *self.latency.lock().unwrap();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.check()?;
        self.current().ok_or(RemoteError::NotFound)
    }

    async fn write(&self, doc: &Document) -> RemoteResult<()> {
        self.check()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        *self.doc.lock().unwrap() = Some(doc.clone());
        Ok(())
    }
}

/// Blob backend where a rival writer can be queued to land just before the
/// next `put`, after the caller has fetched its token.
pub(crate) struct RacingBlobs {
    inner: Arc<InMemoryBlobs>,
    rival: Mutex<Option<Vec<u8>>>,
}

impl RacingBlobs {
    pub(crate) fn new(inner: Arc<InMemoryBlobs>) -> Self {
        Self {
            inner,
            rival: Mutex::new(None),
        }
    }

    pub(crate) fn queue_rival(&self, doc: &Document) {
        *self.rival.lock().unwrap() = Some(doc.to_json().unwrap());
    }
}

#[async_trait]
impl BlobBackend for RacingBlobs {
    async fn get(&self) -> RemoteResult<Option<VersionedBlob>> {
        self.inner.get().await
    }

    async fn put(
        &self,
        content: &[u8],
        expected: Option<&VersionToken>,
    ) -> RemoteResult<Option<VersionToken>> {
        let rival = self.rival.lock().unwrap().take();
        if let Some(rival) = rival {
            self.inner.overwrite(&rival);
        }
        self.inner.put(content, expected).await
    }
}
