//! Failure-driven subscription eviction for the push channel.

use std::sync::Arc;

use skpush_storage::{StoreError, SubscriberStore};
use tracing::{debug, warn};

use crate::adapters::DeliveryOutcome;

/// What the tracker did with a failed outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// The subscriber's counter was bumped to this value and persisted.
    Incremented(u32),
    /// The subscriber's record was deleted. Terminal.
    Evicted,
}

/// Tracks per-subscriber push delivery failures against the store.
///
/// The counter is monotonic: successes never decay or reset it, so a
/// subscriber either stays healthy or marches toward eviction. A
/// subscriber whose stored count has reached the limit is evicted by
/// the next failed outcome.
pub struct FailureTracker {
    store: Arc<dyn SubscriberStore>,
    limit: u32,
}

impl FailureTracker {
    pub fn new(store: Arc<dyn SubscriberStore>, limit: u32) -> Self {
        Self { store, limit }
    }

    /// Apply one delivery outcome. Successful outcomes are ignored;
    /// outcomes for records that no longer exist are ignored too, since
    /// the subscriber was already evicted or unsubscribed.
    pub async fn record(
        &self,
        outcome: &DeliveryOutcome,
    ) -> Result<Option<FailureAction>, StoreError> {
        if outcome.success {
            return Ok(None);
        }

        let Some(record) = self.store.get(&outcome.subscriber_id).await? else {
            debug!(subscriber = %outcome.subscriber_id, "failure for unknown subscriber ignored");
            return Ok(None);
        };

        if record.send_failure_count >= self.limit {
            match self.store.delete(&outcome.subscriber_id).await {
                Ok(()) => {}
                // Concurrent eviction: deletion is idempotent.
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
            warn!(
                subscriber = %outcome.subscriber_id,
                failures = record.send_failure_count,
                "evicting subscriber after repeated send failures"
            );
            Ok(Some(FailureAction::Evicted))
        } else {
            let mut updated = record;
            updated.send_failure_count += 1;
            self.store.set(&outcome.subscriber_id, &updated).await?;
            debug!(
                subscriber = %outcome.subscriber_id,
                failures = updated.send_failure_count,
                "recorded send failure"
            );
            Ok(Some(FailureAction::Incremented(updated.send_failure_count)))
        }
    }
}
