//! Quiver HTTP adapter
//!
//! Maps GET/HEAD requests onto [`quiver_maven::LookupService`] and its
//! outcomes onto HTTP responses.

pub mod handlers;
pub mod response;
pub mod router;
pub mod state;

pub use router::router;
pub use state::AppState;
