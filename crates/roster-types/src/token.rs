use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque revision tag handed out by a remote store.
///
/// Remote stores return a token with every read and require the current one
/// on write; a stale token means someone else wrote in between. Callers never
/// interpret the contents.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// Wrap a token exactly as the remote returned it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Token derived from content bytes (BLAKE3, hex encoded).
    ///
    /// Used by stores that version by content hash.
    pub fn of_content(data: &[u8]) -> Self {
        Self(hex::encode(blake3::hash(data).as_bytes()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 characters, for logs.
    pub fn short(&self) -> &str {
        let end = self.0.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.0.len());
        &self.0[..end]
    }
}

impl fmt::Debug for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VersionToken({})", self.short())
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
