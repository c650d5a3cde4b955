use skpush_storage::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Subscriber not found: {0}")]
    SubscriberNotFound(String),

    #[error("Invalid subscriber record: {0}")]
    InvalidRecord(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl NotificationError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    pub fn send_failed(msg: impl Into<String>) -> Self {
        Self::SendFailed(msg.into())
    }

    pub fn subscriber_not_found(id: impl Into<String>) -> Self {
        Self::SubscriberNotFound(id.into())
    }
}
