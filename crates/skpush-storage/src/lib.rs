//! Subscriber persistence for skpush.
//!
//! The store is the sole source of truth for subscriber state: the
//! engine re-reads it on every notification and never caches records
//! across events. Two backends are provided, an in-memory map for tests
//! and local use, and the host's resource CRUD API for production.

pub mod error;
pub mod memory;
pub mod resources;
pub mod traits;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use resources::ResourcesStore;
pub use traits::SubscriberStore;
