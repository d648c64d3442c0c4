//! Local persistence for Roster.
//!
//! Two layers:
//!
//! - [`KeyValueSlots`] - a synchronous string key-value store that survives
//!   process restarts ([`FileSlots`]) or lives for the process only
//!   ([`InMemorySlots`]).
//! - [`LocalCache`] - the last-known-good [`Document`](roster_types::Document),
//!   implemented by [`DocumentCache`] on top of a single slot.
//!
//! # Design Rules
//!
//! 1. Slots are fully replaced on `set`; there is no partial update.
//! 2. The document cache is best-effort: it never returns an error. An
//!    undecodable slot reads as absent, a failed write is logged.
//! 3. Slot keys are flat names (no path separators).

pub mod cache;
pub mod error;
pub mod file;
pub mod memory;
pub mod traits;

pub use cache::{DocumentCache, LocalCache};
pub use error::{StoreError, StoreResult};
pub use file::FileSlots;
pub use memory::InMemorySlots;
pub use traits::KeyValueSlots;

/// Well-known slot keys.
pub mod keys {
    /// Cached copy of the shared document.
    pub const DOCUMENT: &str = "genshinUsers";
    /// Passcode of the logged-in account.
    pub const CURRENT_USER: &str = "currentUser";
    /// The guest account, never synced remotely.
    pub const GUEST: &str = "guestData";
}
