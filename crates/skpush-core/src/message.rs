use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::notification::Notification;

fn heading(notification: &Notification, path: Option<&str>) -> String {
    match path {
        Some(path) => format!("{} notification on {}", notification.state.heading(), path),
        None => format!("{} notification", notification.state.heading()),
    }
}

/// Outbound mail content: one subject and text body for the whole batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub text: String,
}

impl MailMessage {
    /// Pure function of `(notification, path)`; the notification is never
    /// mutated.
    #[must_use]
    pub fn from_notification(notification: &Notification, path: Option<&str>) -> Self {
        Self {
            subject: heading(notification, path),
            text: notification.message.clone(),
        }
    }
}

/// Outbound web-push payload, serialized as the JSON body of each push.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub title: String,
    pub options: PushMessageOptions,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessageOptions {
    /// The watched path the notification arrived on, empty for targeted
    /// test pushes.
    pub id: String,
    pub body: String,
    /// Unix milliseconds at construction time.
    pub timestamp: i64,
}

impl PushMessage {
    #[must_use]
    pub fn from_notification(notification: &Notification, path: Option<&str>) -> Self {
        let now = OffsetDateTime::now_utc();
        let issued = now.format(&Rfc3339).unwrap_or_default();
        Self {
            title: heading(notification, path),
            options: PushMessageOptions {
                id: path.unwrap_or("").to_string(),
                body: format!("{}\nIssued on {}", notification.message, issued),
                timestamp: (now.unix_timestamp_nanos() / 1_000_000) as i64,
            },
        }
    }
}
