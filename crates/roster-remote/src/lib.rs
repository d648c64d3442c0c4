//! Remote tiers for Roster.
//!
//! A remote tier stores the whole shared [`Document`](roster_types::Document)
//! somewhere off the machine. Two kinds exist:
//!
//! - [`BlobStoreClient`] - a single named JSON blob in a versioned object
//!   store, written with optimistic concurrency. The wire side is a
//!   [`BlobBackend`]: [`ContentsApi`] over HTTP, or [`InMemoryBlobs`] for
//!   tests and embedding.
//! - [`FallbackClient`] - a plain GET/POST JSON endpoint with no versioning,
//!   used when no blob store credential is configured.
//!
//! Both implement [`RemoteStore`] and report failures through the
//! [`RemoteError`] taxonomy.

pub mod blob;
pub mod config;
pub mod contents;
pub mod error;
pub mod fallback;
pub mod memory;
pub mod traits;

pub use blob::BlobStoreClient;
pub use config::BlobStoreSettings;
pub use contents::ContentsApi;
pub use error::{RemoteError, RemoteResult};
pub use fallback::FallbackClient;
pub use memory::InMemoryBlobs;
pub use traits::{BlobBackend, RemoteKind, RemoteStore, VersionedBlob};
