use std::sync::Arc;

use roster_types::Document;
use tracing::warn;

use crate::keys;
use crate::traits::KeyValueSlots;

/// Last-known-good copy of the shared document.
///
/// Best-effort by contract: neither method fails. Corrupt contents read as
/// absent; write failures are logged and dropped.
pub trait LocalCache: Send + Sync {
    fn read(&self) -> Option<Document>;

    /// Replace the cached document.
    fn write(&self, doc: &Document);
}

/// [`LocalCache`] stored as compact JSON in one slot.
pub struct DocumentCache {
    slots: Arc<dyn KeyValueSlots>,
    key: String,
}

impl DocumentCache {
    /// Cache stored under the default [`keys::DOCUMENT`] slot.
    pub fn new(slots: Arc<dyn KeyValueSlots>) -> Self {
        Self::with_key(slots, keys::DOCUMENT)
    }

    pub fn with_key(slots: Arc<dyn KeyValueSlots>, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    /// The slot store backing this cache.
    pub fn slots(&self) -> &Arc<dyn KeyValueSlots> {
        &self.slots
    }
}

impl LocalCache for DocumentCache {
    fn read(&self) -> Option<Document> {
        let raw = match self.slots.get(&self.key) {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key = %self.key, error = %e, "local cache unreadable");
                return None;
            }
        };
        match Document::from_json(raw.as_bytes()) {
            Ok(doc) => Some(doc),
            Err(e) => {
                warn!(key = %self.key, error = %e, "local cache holds undecodable data; ignoring");
                None
            }
        }
    }

    fn write(&self, doc: &Document) {
        let encoded = match serde_json::to_string(doc) {
            Ok(s) => s,
            Err(e) => {
                warn!(key = %self.key, error = %e, "failed to encode document for local cache");
                return;
            }
        };
        if let Err(e) = self.slots.set(&self.key, &encoded) {
            warn!(key = %self.key, error = %e, "failed to write local cache");
        }
    }
}

impl std::fmt::Debug for DocumentCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentCache").field("key", &self.key).finish()
    }
}
