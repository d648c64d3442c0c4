//! High-level SDK for Roster.
//!
//! [`RosterConfig`] decides where data lives and builds the
//! [`TieredStore`]; [`Session`] is the logged-in (or guest) handle every
//! roster operation goes through. Applications embedding Roster start here.

pub mod config;
pub mod error;
pub mod session;

pub use config::{RosterConfig, TOKEN_ENV};
pub use error::{SdkError, SdkResult};
pub use session::{erase_all, register, Identity, SectionSummary, Session, View, GUEST_NAME};

// Re-export key types
pub use roster_store::KeyValueSlots;
pub use roster_sync::{Fetched, SaveOutcome, Tier, TieredStore};
pub use roster_types::{Account, Document, Friend};
