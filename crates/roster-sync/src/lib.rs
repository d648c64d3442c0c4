//! Tiered synchronization for Roster.
//!
//! [`TieredStore`] answers reads from whichever tier can: a fresh local
//! cache, the configured remote, a stale local cache, or finally an empty
//! document. Writes land in the local cache first and are then pushed to the
//! remote on a best-effort basis. Nothing here raises to callers; every
//! outcome is a value ([`Fetched`], [`SaveOutcome`]) that says which tier
//! answered and what went wrong on the way.
//!
//! [`Poller`] refreshes the store in the background and hands each fresh
//! remote copy to a [`Subscriber`].

pub mod poller;
pub mod tier;
pub mod tiered;

#[cfg(test)]
pub(crate) mod testing;

pub use poller::{Poller, PollerState, Subscriber};
pub use tier::{Fetched, Resolution, Tier, TierOutcome};
pub use tiered::{SaveOutcome, TieredStore, Updated, DEFAULT_REFRESH_INTERVAL};
