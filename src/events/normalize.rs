//! Mapping of stored event documents onto [`CanonicalEvent`].
//!
//! Documents written by different generations of the admin tooling name the
//! same concept differently (`title_raw`, `title_ai`, `department_tags`, ...).
//! Each canonical field is resolved on its own through an ordered alias list:
//! the first name holding a non-null value decides the field, otherwise the
//! field default applies. Nothing here looks at which "version" a document is.
//!
//! A present value is taken as stored, so `summary: ""` stays empty and
//! `tags: []` still means every audience. Only the title and the identifier,
//! which must not be blank, skip blank values and move on to the next alias.
//! A present value of the wrong shape (a map where text is expected) yields
//! the field default.

use super::models::{
    CanonicalEvent, RawRecord, DEFAULT_EVENT_TYPE, UNKNOWN_VENUE, UNTITLED_EVENT,
};
use super::priority::PriorityScale;
use super::time::EventTime;
use crate::error::{Error, NotifierResult};
use serde_json::Value;

pub const ID_FIELDS: &[&str] = &["event_id", "id"];
pub const TITLE_FIELDS: &[&str] = &["title", "title_raw", "title_ai", "summary"];
pub const SUMMARY_FIELDS: &[&str] = &["summary", "summary_ai"];
pub const DESCRIPTION_FIELDS: &[&str] = &["description", "description_raw", "description_ai"];
pub const TAG_FIELDS: &[&str] = &["tags", "department_tags"];
pub const EVENT_TYPE_FIELDS: &[&str] = &["eventType", "event_type"];
pub const PRIORITY_FIELDS: &[&str] = &["priority"];
pub const VENUE_FIELDS: &[&str] = &["venue"];
pub const START_TIME_FIELDS: &[&str] = &["startTime", "start_time"];
pub const END_TIME_FIELDS: &[&str] = &["endTime", "end_time"];
pub const CREATED_AT_FIELDS: &[&str] = &["createdAt", "created_at"];
pub const UPDATED_AT_FIELDS: &[&str] = &["updatedAt", "updated_at"];

/// Turns raw records into canonical events.
///
/// Pure and deterministic: no I/O, no logging, no clock reads.
#[derive(Debug, Clone, Default)]
pub struct Normalizer {
    priorities: PriorityScale,
}

impl Normalizer {
    pub fn new(priorities: PriorityScale) -> Self {
        Self { priorities }
    }

    pub fn priorities(&self) -> &PriorityScale {
        &self.priorities
    }

    /// Normalize one record.
    ///
    /// `id_hint` (usually the storage key) wins over any identifier embedded
    /// in the record. Fails only with [`Error::MissingIdentifier`].
    pub fn normalize(&self, raw: &RawRecord, id_hint: Option<&str>) -> NotifierResult<CanonicalEvent> {
        let id = id_hint
            .filter(|hint| !hint.trim().is_empty())
            .map(str::to_string)
            .or_else(|| resolve_nonblank_text(raw, ID_FIELDS))
            .ok_or(Error::MissingIdentifier)?;

        Ok(CanonicalEvent {
            id,
            title: resolve_nonblank_text(raw, TITLE_FIELDS).unwrap_or_else(|| UNTITLED_EVENT.to_string()),
            summary: resolve_text(raw, SUMMARY_FIELDS).unwrap_or_default(),
            description: resolve_text(raw, DESCRIPTION_FIELDS).unwrap_or_default(),
            tags: resolve_tags(raw, TAG_FIELDS).unwrap_or_default(),
            event_type: resolve_text(raw, EVENT_TYPE_FIELDS)
                .unwrap_or_else(|| DEFAULT_EVENT_TYPE.to_string()),
            priority: resolve_text(raw, PRIORITY_FIELDS)
                .unwrap_or_else(|| self.priorities.lowest().to_string()),
            venue: resolve_text(raw, VENUE_FIELDS).unwrap_or_else(|| UNKNOWN_VENUE.to_string()),
            start_time: resolve_time(raw, START_TIME_FIELDS),
            end_time: resolve_time(raw, END_TIME_FIELDS),
            created_at: resolve_opaque(raw, CREATED_AT_FIELDS),
            updated_at: resolve_opaque(raw, UPDATED_AT_FIELDS),
        })
    }
}

/// Normalize with the default priority scale
pub fn normalize(raw: &RawRecord, id_hint: Option<&str>) -> NotifierResult<CanonicalEvent> {
    Normalizer::default().normalize(raw, id_hint)
}

/// Scalar values as text, kept as stored; lists and maps yield nothing
fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// The first non-null value among `fields`
fn first_present<'a>(raw: &'a RawRecord, fields: &[&str]) -> Option<&'a Value> {
    fields
        .iter()
        .find_map(|field| raw.get(*field).filter(|value| !value.is_null()))
}

/// Text of the first present field, even when empty
pub fn resolve_text(raw: &RawRecord, fields: &[&str]) -> Option<String> {
    first_present(raw, fields).and_then(text_value)
}

/// Text of the first field holding non-blank text
pub fn resolve_nonblank_text(raw: &RawRecord, fields: &[&str]) -> Option<String> {
    fields.iter().find_map(|field| {
        raw.get(*field)
            .and_then(text_value)
            .filter(|text| !text.trim().is_empty())
    })
}

/// Tags arrive as a list, or from older tooling as one comma-separated string.
/// The all-departments sentinel is kept verbatim like any other tag.
fn tag_list(value: &Value) -> Option<Vec<String>> {
    match value {
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(text_value)
                .filter(|tag| !tag.trim().is_empty())
                .collect(),
        ),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        _ => None,
    }
}

/// Tags of the first present field; `None` when no field holds a tag list
pub fn resolve_tags(raw: &RawRecord, fields: &[&str]) -> Option<Vec<String>> {
    first_present(raw, fields).and_then(tag_list)
}

fn resolve_time(raw: &RawRecord, fields: &[&str]) -> EventTime {
    resolve_text(raw, fields)
        .map(|text| EventTime::parse(&text))
        .unwrap_or_default()
}

fn resolve_opaque(raw: &RawRecord, fields: &[&str]) -> Value {
    first_present(raw, fields).cloned().unwrap_or(Value::Null)
}
