use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::traits::{validate_key, KeyValueSlots};

/// In-memory, HashMap-based slots.
///
/// Intended for tests and embedding. Nothing survives the process.
pub struct InMemorySlots {
    slots: RwLock<HashMap<String, String>>,
}

impl InMemorySlots {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Number of slots currently set.
    pub fn len(&self) -> usize {
        self.slots.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.read().expect("lock poisoned").is_empty()
    }
}

impl Default for InMemorySlots {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueSlots for InMemorySlots {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        validate_key(key)?;
        Ok(self.slots.read().expect("lock poisoned").get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        validate_key(key)?;
        self.slots
            .write()
            .expect("lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> StoreResult<bool> {
        validate_key(key)?;
        Ok(self.slots.write().expect("lock poisoned").remove(key).is_some())
    }

    fn clear(&self) -> StoreResult<()> {
        self.slots.write().expect("lock poisoned").clear();
        Ok(())
    }
}

impl std::fmt::Debug for InMemorySlots {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemorySlots")
            .field("slot_count", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_get_remove() {
        let slots = InMemorySlots::new();
        assert_eq!(slots.get("a").unwrap(), None);
        slots.set("a", "1").unwrap();
        slots.set("a", "2").unwrap();
        assert_eq!(slots.get("a").unwrap().as_deref(), Some("2"));
        assert!(slots.remove("a").unwrap());
        assert!(!slots.remove("a").unwrap());
        assert!(slots.is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let slots = InMemorySlots::new();
        slots.set("a", "1").unwrap();
        slots.set("b", "2").unwrap();
        assert_eq!(slots.len(), 2);
        slots.clear().unwrap();
        assert!(slots.is_empty());
    }

    #[test]
    fn invalid_key_rejected() {
        let slots = InMemorySlots::new();
        assert!(slots.set("../x", "1").is_err());
    }
}
