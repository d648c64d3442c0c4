use crate::error::{StoreError, StoreResult};

/// Synchronous string key-value storage.
///
/// Implementations must be thread-safe (`Send + Sync`). Every `set` replaces
/// the whole value stored under the key.
pub trait KeyValueSlots: Send + Sync {
    /// Read a slot. Returns `Ok(None)` if it was never set.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Create or replace a slot.
    fn set(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Remove a slot. Returns `true` if it existed.
    fn remove(&self, key: &str) -> StoreResult<bool>;

    /// Remove every slot.
    fn clear(&self) -> StoreResult<()>;
}

/// Reject keys that could escape a flat namespace.
pub(crate) fn validate_key(key: &str) -> StoreResult<()> {
    let ok = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !key.starts_with('.');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_string()))
    }
}
