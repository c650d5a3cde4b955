use serde::{Deserialize, Serialize};

/// Delivery channel for a subscriber, derived from the shape of its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Mail,
    Push,
}

impl Channel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mail => "email",
            Self::Push => "webpush",
        }
    }
}

/// Web-push subscription descriptor as posted by a browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub endpoint: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<i64>,

    pub keys: PushSubscriptionKeys,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushSubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

impl PushSubscription {
    /// Short opaque tag for logging: the trailing characters of the
    /// endpoint URL, which push services randomize per subscription.
    /// The endpoint is client-supplied, so the cut must respect char
    /// boundaries.
    #[must_use]
    pub fn tag(&self) -> &str {
        let mut start = self.endpoint.len().saturating_sub(8);
        while !self.endpoint.is_char_boundary(start) {
            start += 1;
        }
        &self.endpoint[start..]
    }
}

/// The record persisted in the subscriber store, one per subscriber id.
///
/// Mail subscribers are keyed by address and store an empty record; push
/// subscribers carry their subscription and a monotonic failure counter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<PushSubscription>,

    #[serde(default)]
    pub send_failure_count: u32,
}

impl SubscriberRecord {
    #[must_use]
    pub fn for_push(subscription: PushSubscription) -> Self {
        Self {
            subscription: Some(subscription),
            send_failure_count: 0,
        }
    }
}

/// A classified subscriber, produced at the store-read boundary so that
/// downstream code matches on the variant instead of re-testing the id
/// shape.
#[derive(Debug, Clone)]
pub enum Subscriber {
    Mail {
        address: String,
    },
    Push {
        id: String,
        subscription: PushSubscription,
        send_failure_count: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifyError {
    /// A push-shaped id whose record carries no subscription cannot be
    /// delivered to.
    #[error("subscriber '{0}' has no push subscription on record")]
    MissingSubscription(String),
}

impl Subscriber {
    /// Classify a stored record by the shape of its key: an id containing
    /// `@` is a mail address, everything else is a push subscriber.
    pub fn classify(id: &str, record: &SubscriberRecord) -> Result<Self, ClassifyError> {
        if id.contains('@') {
            return Ok(Self::Mail {
                address: id.to_string(),
            });
        }
        match &record.subscription {
            Some(subscription) => Ok(Self::Push {
                id: id.to_string(),
                subscription: subscription.clone(),
                send_failure_count: record.send_failure_count,
            }),
            None => Err(ClassifyError::MissingSubscription(id.to_string())),
        }
    }

    #[must_use]
    pub fn channel(&self) -> Channel {
        match self {
            Self::Mail { .. } => Channel::Mail,
            Self::Push { .. } => Channel::Push,
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::Mail { address } => address,
            Self::Push { id, .. } => id,
        }
    }
}
