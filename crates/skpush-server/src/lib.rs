//! The skpush HTTP surface and Signal K host integration.
//!
//! The binary logs into the host, resolves the configured watch list,
//! wires the dispatch engine to polling notification watchers and
//! exposes the subscriber management API over axum.

pub mod handlers;
pub mod host;
pub mod observability;
pub mod server;
pub mod state;

pub use server::{ServerBuilder, SkpushServer, build_app};
pub use state::AppState;
