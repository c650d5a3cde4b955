pub mod email;
pub mod webpush;

use async_trait::async_trait;

use skpush_core::{Channel, MailMessage, PushMessage, PushSubscription};

use crate::error::NotificationError;

/// One push recipient: the store key and its subscription descriptor.
#[derive(Debug, Clone)]
pub struct PushTarget {
    pub id: String,
    pub subscription: PushSubscription,
}

/// Per-recipient delivery result, consumed by the failure tracker.
#[derive(Debug, Clone)]
pub struct DeliveryOutcome {
    pub subscriber_id: String,
    pub channel: Channel,
    pub success: bool,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    #[must_use]
    pub fn delivered(subscriber_id: impl Into<String>, channel: Channel) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            channel,
            success: true,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(
        subscriber_id: impl Into<String>,
        channel: Channel,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            subscriber_id: subscriber_id.into(),
            channel,
            success: false,
            error: Some(detail.into()),
        }
    }
}

/// Batch mail delivery: one message, many addresses, one outcome for the
/// whole call.
#[async_trait]
pub trait MailAdapter: Send + Sync {
    async fn send(&self, message: &MailMessage, to: &[String]) -> Result<(), NotificationError>;

    /// Probe transport connectivity without sending anything.
    async fn verify(&self) -> Result<(), NotificationError>;
}

/// Per-recipient push delivery with isolated failures: one outcome per
/// target, never an early abort.
#[async_trait]
pub trait PushAdapter: Send + Sync {
    async fn send(&self, message: &PushMessage, targets: &[PushTarget]) -> Vec<DeliveryOutcome>;
}

pub use email::SmtpMailAdapter;
pub use webpush::HttpPushAdapter;

#[cfg(test)]
mod tests {
    use super::*;

    // Compile-time tests that the adapter traits are object-safe
    fn _assert_mail_object_safe(_: &dyn MailAdapter) {}
    fn _assert_push_object_safe(_: &dyn PushAdapter) {}
}
