use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::state::NotificationState;

/// A state-change notification as delivered by the host stream.
///
/// Read-only to the engine: one event may fan out to many subscribers
/// and is never mutated along the way.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub state: NotificationState,

    /// Presentation methods requested by the alarm source ("visual",
    /// "sound"). An event without any method is treated as noise and
    /// never dispatched.
    #[serde(default)]
    pub method: Vec<String>,

    #[serde(default)]
    pub message: String,

    #[serde(with = "time::serde::rfc3339::option", default)]
    pub timestamp: Option<OffsetDateTime>,
}

impl Notification {
    #[must_use]
    pub fn new(state: NotificationState, message: impl Into<String>) -> Self {
        Self {
            state,
            method: vec!["visual".to_string()],
            message: message.into(),
            timestamp: Some(OffsetDateTime::now_utc()),
        }
    }

    /// Whether this event carries a method marker and is worth dispatching.
    #[must_use]
    pub fn has_method(&self) -> bool {
        !self.method.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_host_payload() {
        let json = r#"{
            "state": "alarm",
            "method": ["visual", "sound"],
            "message": "engine over temperature",
            "timestamp": "2024-06-01T12:00:00Z"
        }"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert_eq!(n.state, NotificationState::Alarm);
        assert!(n.has_method());
        assert_eq!(n.message, "engine over temperature");
        assert!(n.timestamp.is_some());
    }

    #[test]
    fn test_missing_method_is_noise() {
        let json = r#"{"state": "normal", "message": "ok"}"#;
        let n: Notification = serde_json::from_str(json).unwrap();
        assert!(!n.has_method());
        assert!(n.timestamp.is_none());
    }
}
