use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use roster_remote::{BlobStoreClient, BlobStoreSettings, ContentsApi, FallbackClient, RemoteStore};
use roster_store::{DocumentCache, FileSlots, InMemorySlots, KeyValueSlots};
use roster_sync::TieredStore;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};

/// Environment variable that supplies the blob store credential.
pub const TOKEN_ENV: &str = "ROSTER_BLOB_TOKEN";

/// Client-side configuration.
///
/// ```toml
/// fallback_url = "http://127.0.0.1:8787/api/roster"
/// cache_dir = "~/.roster"
/// refresh_interval_ms = 5000
///
/// [blob_store]
/// owner = "genshin-users"
/// repo = "data-storage"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    pub blob_store: BlobStoreSettings,
    /// Plain JSON endpoint used when no blob store credential is set.
    pub fallback_url: Option<String>,
    pub fallback_timeout_secs: u64,
    /// Directory for local slots. In-memory when unset.
    pub cache_dir: Option<PathBuf>,
    pub refresh_interval_ms: u64,
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            blob_store: BlobStoreSettings::default(),
            fallback_url: None,
            fallback_timeout_secs: 15,
            cache_dir: None,
            refresh_interval_ms: 5000,
        }
    }
}

impl RosterConfig {
    pub fn from_file(path: impl AsRef<Path>) -> SdkResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| SdkError::Config(format!("cannot read {}: {e}", path.display())))?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> SdkResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| SdkError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Pick up the credential from [`TOKEN_ENV`] if it is set.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            self.set_token(&token);
        }
        self
    }

    /// Set the blob store credential. Blank values are ignored.
    pub fn set_token(&mut self, token: &str) {
        let token = token.trim();
        if !token.is_empty() {
            self.blob_store.token = Some(token.to_string());
        }
    }

    pub fn validate(&self) -> SdkResult<()> {
        if self.refresh_interval_ms == 0 {
            return Err(SdkError::Config("refresh_interval_ms must be greater than 0".into()));
        }
        if self.blob_store.timeout_secs == 0 || self.fallback_timeout_secs == 0 {
            return Err(SdkError::Config("timeouts must be greater than 0".into()));
        }
        if self.fallback_url.as_deref().is_some_and(|u| u.trim().is_empty()) {
            return Err(SdkError::Config("fallback_url must not be blank".into()));
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn open_slots(&self) -> SdkResult<Arc<dyn KeyValueSlots>> {
        match &self.cache_dir {
            Some(dir) => {
                debug!(dir = %dir.display(), "opening file slots");
                Ok(Arc::new(FileSlots::open(dir)?))
            }
            None => Ok(Arc::new(InMemorySlots::new())),
        }
    }

    /// The remote tier: blob store if a credential is set, else the
    /// fallback endpoint if one is configured, else none.
    pub fn remote(&self) -> SdkResult<Option<Arc<dyn RemoteStore>>> {
        if self.blob_store.is_configured() {
            let api = ContentsApi::new(self.blob_store.clone())?;
            info!(url = %self.blob_store.contents_url(), "using blob store");
            return Ok(Some(Arc::new(BlobStoreClient::new(api))));
        }
        if let Some(url) = &self.fallback_url {
            let timeout = Duration::from_secs(self.fallback_timeout_secs);
            info!(%url, "using fallback endpoint");
            return Ok(Some(Arc::new(FallbackClient::new(url.clone(), timeout)?)));
        }
        info!("no remote configured; working locally");
        Ok(None)
    }

    pub fn build_store(&self, slots: Arc<dyn KeyValueSlots>) -> SdkResult<TieredStore> {
        let cache = Arc::new(DocumentCache::new(slots));
        let mut store = TieredStore::new(cache).with_refresh_interval(self.refresh_interval());
        if let Some(remote) = self.remote()? {
            store = store.with_remote(remote);
        }
        Ok(store)
    }
}
