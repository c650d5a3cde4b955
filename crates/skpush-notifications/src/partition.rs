use std::collections::HashMap;

use skpush_core::{Subscriber, SubscriberRecord};
use tracing::debug;

use crate::adapters::PushTarget;

/// Stored subscribers split by delivery channel.
///
/// Every input key lands in exactly one bucket: mail addresses, push
/// targets, or malformed push records that cannot be delivered to.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    pub mail: Vec<String>,
    pub push: Vec<PushTarget>,
    pub malformed: Vec<String>,
}

impl Partition {
    #[must_use]
    pub fn total(&self) -> usize {
        self.mail.len() + self.push.len() + self.malformed.len()
    }
}

/// Classify a store snapshot into channel groups.
///
/// Deterministic: buckets are sorted by subscriber id regardless of map
/// iteration order.
#[must_use]
pub fn partition(subscribers: &HashMap<String, SubscriberRecord>) -> Partition {
    let mut out = Partition::default();

    for (id, record) in subscribers {
        match Subscriber::classify(id, record) {
            Ok(Subscriber::Mail { address }) => out.mail.push(address),
            Ok(Subscriber::Push {
                id, subscription, ..
            }) => out.push.push(PushTarget { id, subscription }),
            Err(e) => {
                debug!(subscriber = %id, error = %e, "skipping malformed subscriber record");
                out.malformed.push(id.clone());
            }
        }
    }

    out.mail.sort();
    out.push.sort_by(|a, b| a.id.cmp(&b.id));
    out.malformed.sort();
    out
}
