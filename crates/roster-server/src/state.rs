use std::path::Path;
use std::sync::Arc;

use roster_store::{FileSlots, InMemorySlots, KeyValueSlots};
use roster_types::Document;
use tracing::debug;

use crate::error::{ServerError, ServerResult};

/// Slot the hosted document is kept under.
pub const ROSTER_SLOT: &str = "roster";

/// Shared handler state: the hosted document's backing slots.
#[derive(Clone)]
pub struct AppState {
    slots: Arc<dyn KeyValueSlots>,
}

impl AppState {
    pub fn new(slots: Arc<dyn KeyValueSlots>) -> Self {
        Self { slots }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySlots::new()))
    }

    pub fn on_disk(dir: impl AsRef<Path>) -> ServerResult<Self> {
        Ok(Self::new(Arc::new(FileSlots::open(dir)?)))
    }

    /// The hosted document; empty until the first write.
    pub fn load(&self) -> ServerResult<Document> {
        match self.slots.get(ROSTER_SLOT)? {
            Some(raw) => {
                Document::from_json(raw.as_bytes()).map_err(|e| ServerError::Corrupt(e.to_string()))
            }
            None => Ok(Document::new()),
        }
    }

    pub fn replace(&self, doc: &Document) -> ServerResult<()> {
        let encoded = doc
            .to_json()
            .map_err(|e| ServerError::Internal(e.to_string()))?;
        let encoded = String::from_utf8(encoded).map_err(|e| ServerError::Internal(e.to_string()))?;
        self.slots.set(ROSTER_SLOT, &encoded)?;
        debug!(accounts = doc.len(), "document replaced");
        Ok(())
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_types::Account;

    #[test]
    fn empty_until_written() {
        let state = AppState::in_memory();
        assert!(state.load().unwrap().is_empty());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let mut doc = Document::new();
        doc.insert("abc", Account::new("Foo"));

        AppState::on_disk(dir.path()).unwrap().replace(&doc).unwrap();
        let reopened = AppState::on_disk(dir.path()).unwrap();
        assert_eq!(reopened.load().unwrap(), doc);
    }

    #[test]
    fn corrupt_slot_is_reported() {
        let slots = Arc::new(InMemorySlots::new());
        slots.set(ROSTER_SLOT, "not json").unwrap();
        let state = AppState::new(slots);
        assert!(matches!(state.load(), Err(ServerError::Corrupt(_))));
    }
}
