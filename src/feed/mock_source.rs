//! Fixed stand-in for masjid website and social media scraping.

use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Datelike;
use chrono::Local;
use chrono::NaiveDate;
use chrono::TimeDelta;
use chrono::Utc;
use log::debug;

use crate::entity::AgeGroup;
use crate::entity::Category;
use crate::entity::EventRecord;
use crate::entity::EventSourceKind;
use crate::entity::RecommendationType;
use crate::feed::EventSource;
use crate::feed::error::FeedError;

/// Number of records every mock scrape produces.
pub const MOCK_EVENT_COUNT: usize = 8;

const ICM: &str = "Islamic Center of Maryland (ICM)";
const ADAMS: &str = "ADAMS Center";
const DAR_US_SALAAM: &str = "Dar-us-Salaam";
const MCC: &str = "MCC Chicago";

#[derive(Clone, Copy)]
enum DayOffset {
    NextFriday,
    Days(i64),
}

struct EventTemplate {
    key: &'static str,
    seq: u8,
    title: &'static str,
    masjid: &'static str,
    day: DayOffset,
    time: &'static str,
    category: Category,
    attendees: u32,
    recommendation_type: RecommendationType,
    distance: &'static str,
    description: &'static str,
    age_group: AgeGroup,
    source: EventSourceKind,
}

const TEMPLATES: [EventTemplate; MOCK_EVENT_COUNT] = [
    EventTemplate {
        key: "icm",
        seq: 1,
        title: "Jummah Prayer & Khutbah",
        masjid: ICM,
        day: DayOffset::NextFriday,
        time: "1:15 PM",
        category: Category::Prayer,
        attendees: 280,
        recommendation_type: RecommendationType::Local,
        distance: "2.3 miles",
        description: "Weekly Friday congregational prayer with English and Arabic khutbah.",
        age_group: AgeGroup::AllAges,
        source: EventSourceKind::Website,
    },
    EventTemplate {
        key: "adams",
        seq: 1,
        title: "Youth Basketball Tournament",
        masjid: ADAMS,
        day: DayOffset::Days(2),
        time: "6:00 PM",
        category: Category::Sports,
        attendees: 45,
        recommendation_type: RecommendationType::Personalized,
        distance: "4.1 miles",
        description: "Annual youth basketball tournament for ages 13-18. Registration required.",
        age_group: AgeGroup::Teens,
        source: EventSourceKind::Instagram,
    },
    EventTemplate {
        key: "dus",
        seq: 1,
        title: "Sisters' Study Circle",
        masjid: DAR_US_SALAAM,
        day: DayOffset::Days(3),
        time: "7:30 PM",
        category: Category::Education,
        attendees: 25,
        recommendation_type: RecommendationType::Following,
        distance: "1.8 miles",
        description: "Weekly sisters-only Islamic studies focusing on Tafseer Al-Quran.",
        age_group: AgeGroup::Adults,
        source: EventSourceKind::Website,
    },
    EventTemplate {
        key: "icm",
        seq: 2,
        title: "Quran Memorization Competition",
        masjid: ICM,
        day: DayOffset::Days(4),
        time: "2:00 PM",
        category: Category::Competition,
        attendees: 65,
        recommendation_type: RecommendationType::Personalized,
        distance: "2.3 miles",
        description: "Annual Hifz competition for children and youth. Prizes for all participants.",
        age_group: AgeGroup::Kids,
        source: EventSourceKind::Facebook,
    },
    EventTemplate {
        key: "mcc",
        seq: 1,
        title: "Community Iftar Planning",
        masjid: MCC,
        day: DayOffset::Days(5),
        time: "8:00 PM",
        category: Category::Planning,
        attendees: 20,
        recommendation_type: RecommendationType::Local,
        distance: "8.2 miles",
        description: "Planning meeting for upcoming community Iftar during Ramadan.",
        age_group: AgeGroup::Adults,
        source: EventSourceKind::Website,
    },
    EventTemplate {
        key: "adams",
        seq: 2,
        title: "Islamic Finance Workshop",
        masjid: ADAMS,
        day: DayOffset::Days(6),
        time: "10:00 AM",
        category: Category::Education,
        attendees: 42,
        recommendation_type: RecommendationType::Following,
        distance: "4.1 miles",
        description: "Learn about halal investing, Islamic banking, and avoiding riba.",
        age_group: AgeGroup::Adults,
        source: EventSourceKind::Instagram,
    },
    EventTemplate {
        key: "dus",
        seq: 2,
        title: "Family Game Night",
        masjid: DAR_US_SALAAM,
        day: DayOffset::Days(7),
        time: "6:00 PM",
        category: Category::Family,
        attendees: 55,
        recommendation_type: RecommendationType::Local,
        distance: "1.8 miles",
        description: "Fun evening of board games, Islamic trivia, and light refreshments.",
        age_group: AgeGroup::Family,
        source: EventSourceKind::Website,
    },
    EventTemplate {
        key: "icm",
        seq: 3,
        title: "Arabic Calligraphy Class",
        masjid: ICM,
        day: DayOffset::Days(8),
        time: "4:00 PM",
        category: Category::Arts,
        attendees: 18,
        recommendation_type: RecommendationType::Personalized,
        distance: "2.3 miles",
        description: "Learn the beautiful art of Arabic calligraphy. All skill levels welcome.",
        age_group: AgeGroup::AllAges,
        source: EventSourceKind::Website,
    },
];

/// Deterministic generator of the eight reference events.
///
/// Dates are computed relative to the local day of the call. Each call gets a
/// generation stamp that is strictly greater than the previous one, so record
/// ids and `last_updated` never repeat across calls on the same instance.
pub struct MockEventSource {
    last_stamp: AtomicI64,
}

impl MockEventSource {
    pub fn new() -> Self {
        Self {
            last_stamp: AtomicI64::new(i64::MIN),
        }
    }

    /// Builds the fixed event list as seen at `now`.
    pub fn generate_at(&self, now: DateTime<Local>) -> Vec<EventRecord> {
        let stamp = self.next_stamp(now.timestamp_millis());
        let last_updated = DateTime::<Utc>::from_timestamp_millis(stamp)
            .unwrap_or_else(|| now.with_timezone(&Utc));
        let today = now.date_naive();

        TEMPLATES
            .iter()
            .map(|template| {
                let date = match template.day {
                    DayOffset::NextFriday => next_friday(today),
                    DayOffset::Days(days) => today + TimeDelta::days(days),
                };

                EventRecord {
                    id: format!("{}-{}-{}", template.key, stamp, template.seq),
                    title: template.title.to_string(),
                    masjid: template.masjid.to_string(),
                    date: format_date(date),
                    time: template.time.to_string(),
                    category: template.category,
                    attendees: template.attendees,
                    is_registered: false,
                    recommendation_type: template.recommendation_type,
                    distance: template.distance.to_string(),
                    description: template.description.to_string(),
                    age_group: template.age_group,
                    source: template.source,
                    last_updated,
                }
            })
            .collect()
    }

    /// Reserves a generation stamp, bumping past the last one if the clock
    /// has not moved.
    fn next_stamp(&self, now_millis: i64) -> i64 {
        let mut current = self.last_stamp.load(Ordering::SeqCst);
        loop {
            let next = now_millis.max(current.saturating_add(1));
            match self.last_stamp.compare_exchange(
                current,
                next,
                Ordering::SeqCst,
                Ordering::SeqCst,
            ) {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

#[async_trait]
impl EventSource for MockEventSource {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn scrape(&self) -> Result<Vec<EventRecord>, FeedError> {
        let events = self.generate_at(Local::now());
        debug!("Mock source generated {} events.", events.len());
        Ok(events)
    }
}

/// The next Friday strictly after `today` (a Friday maps to a week later).
fn next_friday(today: NaiveDate) -> NaiveDate {
    let weekday = today.weekday().num_days_from_sunday() as i64;
    let days = match (5 - weekday + 7) % 7 {
        0 => 7,
        n => n,
    };
    today + TimeDelta::days(days)
}

/// en-US short date, e.g. "Dec 15, 2024".
fn format_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
