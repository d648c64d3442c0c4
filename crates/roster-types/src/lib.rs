//! Foundation types for Roster.
//!
//! Every other Roster crate depends on `roster-types`. The whole persisted
//! state is a single [`Document`]: a mapping from passcode to [`Account`].
//! Remote stores tag each stored revision with an opaque [`VersionToken`]
//! used for optimistic concurrency on writes.
//!
//! # Key Types
//!
//! - [`Document`] - passcode → account mapping, the unit of persistence
//! - [`Account`] - username, ordered sections, ordered friends
//! - [`Friend`] - a named game ID, optionally filed under a section
//! - [`VersionToken`] - opaque revision tag returned by a remote store

pub mod document;
pub mod error;
pub mod token;

pub use document::{Account, Document, Friend, NO_ID, UNNAMED};
pub use error::{AccountError, AccountResult};
pub use token::VersionToken;
