//! Core domain types for skpush: notification states and events, the
//! subscriber union, and outbound message construction.

pub mod message;
pub mod notification;
pub mod state;
pub mod subscriber;

pub use message::{MailMessage, PushMessage, PushMessageOptions};
pub use notification::Notification;
pub use state::NotificationState;
pub use subscriber::{
    Channel, ClassifyError, PushSubscription, PushSubscriptionKeys, Subscriber, SubscriberRecord,
};
