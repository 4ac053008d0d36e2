//! Event records and the closed enums they are built from.

use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use serde::Serialize;

/// Kind of community event.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum Category {
    Prayer,
    Sports,
    Education,
    Planning,
    Competition,
    Family,
    Arts,
}

/// Audience an event is aimed at.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
pub enum AgeGroup {
    Kids,
    Teens,
    Adults,
    Family,
    #[serde(rename = "All Ages")]
    #[strum(serialize = "All Ages")]
    AllAges,
}

/// Channel an event was picked up from.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EventSourceKind {
    Website,
    Instagram,
    Facebook,
}

/// Why an event is shown to the user. Only drives the badge.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RecommendationType {
    Personalized,
    Local,
    Following,
}

impl RecommendationType {
    /// Badge label shown next to the event.
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationType::Personalized => "For You",
            RecommendationType::Local => "Nearby",
            RecommendationType::Following => "Following",
        }
    }
}

/// One community event as currently known to the feed.
///
/// Records are regenerated on every scrape cycle, so `id` and `last_updated`
/// are only meaningful within the snapshot that carried them.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: String,
    pub title: String,
    /// Hosting masjid, free text
    pub masjid: String,
    /// Human-formatted date, e.g. "Dec 15, 2024"
    pub date: String,
    /// Human-formatted time of day, e.g. "6:00 PM"
    pub time: String,
    pub category: Category,
    pub attendees: u32,
    pub is_registered: bool,
    pub recommendation_type: RecommendationType,
    /// Human-formatted distance, e.g. "2.3 miles"
    pub distance: String,
    pub description: String,
    pub age_group: AgeGroup,
    pub source: EventSourceKind,
    pub last_updated: DateTime<Utc>,
}

impl EventRecord {
    /// Compares every field except the per-cycle `id` and `last_updated`.
    pub fn same_content(&self, other: &EventRecord) -> bool {
        self.title == other.title
            && self.masjid == other.masjid
            && self.date == other.date
            && self.time == other.time
            && self.category == other.category
            && self.attendees == other.attendees
            && self.is_registered == other.is_registered
            && self.recommendation_type == other.recommendation_type
            && self.distance == other.distance
            && self.description == other.description
            && self.age_group == other.age_group
            && self.source == other.source
    }
}
