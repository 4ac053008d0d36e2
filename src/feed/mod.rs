//! Event generation ("scraping") behind a single async seam.

use std::str::FromStr;

use async_trait::async_trait;

use crate::entity::EventRecord;
use crate::entity::EventSourceKind;
use crate::feed::error::FeedError;

pub mod error;
pub mod mock_source;

/// Produces a complete collection of events for one scrape cycle.
///
/// Every call yields a full replacement snapshot, never a delta. This is the
/// only place a cycle may suspend on I/O.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Generates the full event collection.
    async fn scrape(&self) -> Result<Vec<EventRecord>, FeedError>;
}

/// Keeps only the records that came from `source`, preserving order.
pub fn filter_by_source(events: &[EventRecord], source: EventSourceKind) -> Vec<EventRecord> {
    events
        .iter()
        .filter(|event| event.source == source)
        .cloned()
        .collect()
}

/// Parses a user-supplied source name such as `"instagram"`.
pub fn parse_source(name: &str) -> Result<EventSourceKind, FeedError> {
    EventSourceKind::from_str(name.trim()).map_err(|_| FeedError::UnknownSource {
        name: name.to_string(),
    })
}
