use super::time::EventTime;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An event document as read from storage, in any historical field naming
pub type RawRecord = Map<String, Value>;

/// Title shown when a record has none
pub const UNTITLED_EVENT: &str = "Untitled Event";
/// Venue shown when a record has none
pub const UNKNOWN_VENUE: &str = "TBD";
/// Event type applied when a record has none
pub const DEFAULT_EVENT_TYPE: &str = "general";
/// Tag meaning the event concerns every department
pub const ALL_DEPARTMENTS: &str = "All Departments";
/// Tag given to generated drafts that name no department
pub const GENERAL_TAG: &str = "General";

/// The normalized event every consumer works with.
///
/// All fields are always populated; missing source data shows up as the
/// documented placeholder values instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub id: String,
    pub title: String,
    pub summary: String,
    pub description: String,
    pub tags: Vec<String>,
    pub event_type: String,
    pub priority: String,
    pub venue: String,
    pub start_time: EventTime,
    pub end_time: EventTime,
    /// Server-assigned, passed through untouched (`Null` when absent)
    pub created_at: Value,
    /// Server-assigned, passed through untouched (`Null` when absent)
    pub updated_at: Value,
}

impl CanonicalEvent {
    /// Whether the event addresses every audience, either through the
    /// sentinel tag or by carrying no department tags at all
    pub fn is_for_all_departments(&self) -> bool {
        self.tags.is_empty() || self.tags.iter().any(|tag| tag == ALL_DEPARTMENTS)
    }

    /// Append a tag unless the exact value is already present
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove every occurrence of the exact value
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Whether both times are known and the end precedes the start.
    /// Such events are kept; callers may choose to flag them.
    pub fn has_inverted_times(&self) -> bool {
        match (self.start_time.instant(), self.end_time.instant()) {
            (Some(start), Some(end)) => start > end,
            _ => false,
        }
    }
}
