//! HTTP server for Roster.
//!
//! Hosts the plain JSON fallback endpoint clients use when no blob store
//! credential is configured: `GET` returns the shared document, `POST`
//! replaces it.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;
pub mod state;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use router::ROSTER_PATH;
pub use server::RosterServer;
pub use state::AppState;
