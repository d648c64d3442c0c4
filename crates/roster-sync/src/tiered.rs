use std::sync::{Arc, Mutex};
use std::time::Duration;

use roster_remote::{RemoteError, RemoteStore};
use roster_store::LocalCache;
use roster_types::Document;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::tier::{Fetched, Resolution, Tier, TierOutcome};

/// How long a successful remote round trip keeps the local cache fresh.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(5000);

/// What happened to a save.
#[derive(Clone, Debug, PartialEq)]
pub enum SaveOutcome {
    /// The remote tier accepted the document.
    Persisted(Tier),
    /// Only the local cache holds the document. `tier` is the remote that
    /// refused it, or [`Tier::LocalCache`] when no remote is configured.
    LocalOnly {
        tier: Tier,
        error: Option<RemoteError>,
    },
}

impl SaveOutcome {
    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// `true` when the remote rejected the write because someone else got
    /// there first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::LocalOnly { error: Some(e), .. } if e.is_conflict())
    }

    pub fn error(&self) -> Option<&RemoteError> {
        match self {
            Self::LocalOnly { error, .. } => error.as_ref(),
            Self::Persisted(_) => None,
        }
    }
}

/// Result of [`TieredStore::update`].
#[derive(Clone, Debug, PartialEq)]
pub struct Updated<T> {
    pub value: T,
    pub outcome: SaveOutcome,
}

/// Cache-aside reads and best-effort write-through over a local cache and
/// an optional remote tier.
pub struct TieredStore {
    remote: Option<Arc<dyn RemoteStore>>,
    cache: Arc<dyn LocalCache>,
    refresh_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
    write_gate: tokio::sync::Mutex<()>,
}

impl TieredStore {
    /// Local-only store. Reads come from the cache, saves never persist.
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self {
            remote: None,
            cache,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            last_fetch: Mutex::new(None),
            write_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteStore>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh_interval
    }

    /// Tier that saves go to, if any.
    pub fn remote_tier(&self) -> Option<Tier> {
        self.remote.as_ref().map(|r| Tier::from(r.kind()))
    }

    pub fn cache(&self) -> &Arc<dyn LocalCache> {
        &self.cache
    }

    /// `true` while the last remote round trip is within the refresh
    /// interval.
    pub fn is_fresh(&self) -> bool {
        let last = *self.last_fetch.lock().expect("lock poisoned");
        last.is_some_and(|at| at.elapsed() < self.refresh_interval)
    }

    /// Forget the last remote round trip so the next read goes remote.
    pub fn invalidate(&self) {
        *self.last_fetch.lock().expect("lock poisoned") = None;
    }

    fn mark_fresh(&self) {
        *self.last_fetch.lock().expect("lock poisoned") = Some(Instant::now());
    }

    /// Read the document from the first tier that can answer.
    ///
    /// Order: fresh local cache (skipped when `force`), remote, local cache,
    /// empty. Never fails.
    #[instrument(skip(self), fields(remote = ?self.remote_tier()))]
    pub async fn fetch(&self, force: bool) -> Fetched {
        let mut resolution = Resolution::new().or_else(Tier::LocalCache, || {
            if !force && self.is_fresh() {
                self.cache.read().into()
            } else {
                TierOutcome::Miss
            }
        });
        if let Some(remote) = &self.remote {
            let tier = Tier::from(remote.kind());
            resolution = resolution
                .or_else_async(tier, || self.read_remote(remote.as_ref()))
                .await;
        }
        let fetched = resolution
            .or_else(Tier::LocalCache, || self.cache.read().into())
            .finish();
        for (tier, e) in &fetched.failures {
            warn!(%tier, error = %e, fallback = %fetched.source, "remote read failed");
        }
        fetched
    }

    async fn read_remote(&self, remote: &dyn RemoteStore) -> TierOutcome {
        match remote.read().await {
            Ok(doc) => {
                self.cache.write(&doc);
                self.mark_fresh();
                TierOutcome::Hit(doc)
            }
            Err(RemoteError::NotFound) => {
                info!(kind = %remote.kind(), "remote holds no document yet");
                TierOutcome::Hit(Document::new())
            }
            Err(e) => TierOutcome::Failed(e),
        }
    }

    pub async fn get_data(&self, force: bool) -> Document {
        self.fetch(force).await.document
    }

    /// Write `doc` to the local cache, then try the remote.
    #[instrument(skip(self, doc), fields(accounts = doc.len()))]
    pub async fn save(&self, doc: &Document) -> SaveOutcome {
        self.cache.write(doc);
        let Some(remote) = &self.remote else {
            debug!("no remote tier; saved locally");
            return SaveOutcome::LocalOnly {
                tier: Tier::LocalCache,
                error: None,
            };
        };
        let tier = Tier::from(remote.kind());
        match remote.write(doc).await {
            Ok(()) => {
                self.mark_fresh();
                SaveOutcome::Persisted(tier)
            }
            Err(e) => {
                warn!(%tier, error = %e, "remote write failed; kept local copy");
                SaveOutcome::LocalOnly { tier, error: Some(e) }
            }
        }
    }

    pub async fn save_data(&self, doc: &Document) -> bool {
        self.save(doc).await.is_persisted()
    }

    /// Read-modify-write under the store's write gate.
    ///
    /// Nothing is saved when `f` fails. Other writers in this process wait
    /// for the gate; writers elsewhere are only detected as a conflict in
    /// the returned outcome.
    pub async fn update<T, E, F>(&self, f: F) -> Result<Updated<T>, E>
    where
        F: FnOnce(&mut Document) -> Result<T, E>,
    {
        let _gate = self.write_gate.lock().await;
        let mut doc = self.get_data(false).await;
        let value = f(&mut doc)?;
        let outcome = self.save(&doc).await;
        Ok(Updated { value, outcome })
    }
}

impl std::fmt::Debug for TieredStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TieredStore")
            .field("remote", &self.remote_tier())
            .field("refresh_interval", &self.refresh_interval)
            .field("fresh", &self.is_fresh())
            .finish()
    }
}
