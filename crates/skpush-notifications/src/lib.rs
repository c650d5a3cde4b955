//! The skpush dispatch engine.
//!
//! Turns the configured watch list into a set of live notification
//! paths, partitions stored subscribers into mail and web-push groups,
//! filters each channel by its trigger states and fans every admitted
//! notification out concurrently, feeding push delivery failures into
//! subscription eviction.

pub mod adapters;
pub mod engine;
pub mod error;
pub mod failures;
pub mod filter;
pub mod partition;
pub mod paths;

pub use adapters::{
    DeliveryOutcome, HttpPushAdapter, MailAdapter, PushAdapter, PushTarget, SmtpMailAdapter,
};
pub use engine::{ConnectionState, DispatchEngine, EngineRunner, MailChannel, PushChannel};
pub use error::NotificationError;
pub use failures::{FailureAction, FailureTracker};
pub use filter::ChannelFilter;
pub use partition::{Partition, partition};
pub use paths::{ExpandError, PathExpander, ResolveError, ResolvedPaths, resolve};
