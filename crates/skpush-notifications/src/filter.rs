use std::collections::BTreeSet;

use skpush_core::NotificationState;

/// Per-channel trigger-state filter.
///
/// A channel only acts on states it was explicitly configured for; an
/// empty set admits nothing, so a misconfigured channel stays silent
/// instead of mass-delivering.
#[derive(Debug, Clone, Default)]
pub struct ChannelFilter {
    states: BTreeSet<NotificationState>,
}

impl ChannelFilter {
    #[must_use]
    pub fn new(states: impl IntoIterator<Item = NotificationState>) -> Self {
        Self {
            states: states.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn admits(&self, state: NotificationState) -> bool {
        self.states.contains(&state)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_filter_admits_nothing() {
        let filter = ChannelFilter::default();
        for state in NotificationState::ALL {
            assert!(!filter.admits(state));
        }
    }

    #[test]
    fn test_membership() {
        let filter = ChannelFilter::new([NotificationState::Alarm, NotificationState::Emergency]);
        assert!(filter.admits(NotificationState::Alarm));
        assert!(filter.admits(NotificationState::Emergency));
        assert!(!filter.admits(NotificationState::Normal));
        assert!(!filter.admits(NotificationState::Warn));
    }
}
