use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Notification severity as reported by the host alarm stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Normal,
    Alert,
    Warn,
    Alarm,
    Emergency,
}

impl NotificationState {
    pub const ALL: [NotificationState; 5] = [
        NotificationState::Normal,
        NotificationState::Alert,
        NotificationState::Warn,
        NotificationState::Alarm,
        NotificationState::Emergency,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Alert => "alert",
            Self::Warn => "warn",
            Self::Alarm => "alarm",
            Self::Emergency => "emergency",
        }
    }

    /// The uppercased form used in message subjects and titles.
    #[must_use]
    pub fn heading(&self) -> String {
        self.as_str().to_uppercase()
    }
}

impl fmt::Display for NotificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a recognized notification state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification state: {0}")]
pub struct UnknownState(pub String);

impl FromStr for NotificationState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(Self::Normal),
            "alert" => Ok(Self::Alert),
            "warn" => Ok(Self::Warn),
            "alarm" => Ok(Self::Alarm),
            "emergency" => Ok(Self::Emergency),
            other => Err(UnknownState(other.to_string())),
        }
    }
}
