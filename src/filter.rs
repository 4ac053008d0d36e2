//! Consumer-side filtering over a received snapshot.

use crate::entity::AgeGroup;
use crate::entity::Category;
use crate::entity::EventRecord;
use crate::entity::EventSourceKind;

/// Criteria a consumer applies to the last snapshot it received.
///
/// Empty or `None` criteria match everything.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EventFilter {
    /// Case-insensitive substring of title, masjid or description.
    pub search_query: String,
    pub category: Option<Category>,
    pub age_group: Option<AgeGroup>,
    pub masjids: Vec<String>,
    pub sources: Vec<EventSourceKind>,
}

impl EventFilter {
    pub fn matches(&self, event: &EventRecord) -> bool {
        self.matches_search(event)
            && self.category.is_none_or(|c| c == event.category)
            && self.age_group.is_none_or(|a| a == event.age_group)
            && (self.masjids.is_empty() || self.masjids.contains(&event.masjid))
            && (self.sources.is_empty() || self.sources.contains(&event.source))
    }

    /// Matching events, in input order.
    pub fn apply(&self, events: &[EventRecord]) -> Vec<EventRecord> {
        events.iter().filter(|e| self.matches(e)).cloned().collect()
    }

    fn matches_search(&self, event: &EventRecord) -> bool {
        let query = self.search_query.to_lowercase();
        event.title.to_lowercase().contains(&query)
            || event.masjid.to_lowercase().contains(&query)
            || event.description.to_lowercase().contains(&query)
    }
}
