use std::collections::BTreeMap;

use anyhow::Result;
use log::debug;
use log::info;

use super::Subscriber;
use crate::event::FeedSnapshot;
use crate::filter::EventFilter;

/// Writes a one-line summary of every snapshot to the log, plus the events
/// passing `filter` at debug level.
pub struct LogSubscriber {
    filter: EventFilter,
}

impl LogSubscriber {
    pub fn new(filter: EventFilter) -> Self {
        debug!("Initializing LogSubscriber.");
        Self { filter }
    }

    /// e.g. `#3 (timer): 8 events [facebook: 1, instagram: 2, website: 5]`
    pub fn summarize(snapshot: &FeedSnapshot) -> String {
        let mut by_source: BTreeMap<&'static str, usize> = BTreeMap::new();
        for event in snapshot.events.iter() {
            *by_source.entry(event.source.into()).or_default() += 1;
        }

        let counts = by_source
            .iter()
            .map(|(source, count)| format!("{source}: {count}"))
            .collect::<Vec<_>>()
            .join(", ");

        format!(
            "#{} ({}): {} events [{}]",
            snapshot.sequence,
            snapshot.trigger,
            snapshot.len(),
            counts
        )
    }
}

#[async_trait::async_trait]
impl Subscriber<FeedSnapshot> for LogSubscriber {
    async fn callback(&self, event: FeedSnapshot) -> Result<()> {
        info!("Received snapshot {}", Self::summarize(&event));

        for record in self.filter.apply(&event.events) {
            debug!(
                "{} | {} | {} {} | {}",
                record.title, record.masjid, record.date, record.time, record.source
            );
        }
        Ok(())
    }
}
