use std::sync::Arc;

use chrono::DateTime;
use chrono::Utc;

use crate::entity::EventRecord;

pub mod event_bus;

/// What started a scrape cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum CycleTrigger {
    /// The immediate cycle run by `start_auto_update`.
    Initial,
    Timer,
    Manual,
}

/// Event broadcast after every scrape cycle.
///
/// Always a complete replacement of the previous snapshot, never a delta.
/// Record ids are not stable across snapshots.
#[derive(Clone, Debug, PartialEq)]
pub struct FeedSnapshot {
    /// Strictly increasing per service, in production order.
    pub sequence: u64,
    pub trigger: CycleTrigger,
    pub generated_at: DateTime<Utc>,
    pub events: Arc<[EventRecord]>,
}

impl FeedSnapshot {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
