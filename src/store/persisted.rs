//! Translation of canonical events into the persisted document shape.
//!
//! | canonical     | stored               |
//! |---------------|----------------------|
//! | `title`       | `title`              |
//! | `summary`     | `summary`            |
//! | `description` | `description`        |
//! | `tags`        | `tags`               |
//! | -             | `target_departments` |
//! | `eventType`   | `event_type`         |
//! | `priority`    | `priority`           |
//! | `venue`       | `venue`              |
//! | `startTime`   | `start_time`         |
//! | `endTime`     | `end_time`           |
//! | `createdAt`   | `createdAt`          |
//! | `updatedAt`   | `updatedAt`          |
//!
//! The identifier is the storage key, not a document field. `published_by`
//! records the actor who published.

use crate::events::{CanonicalEvent, RawRecord};
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

/// Build the stored document for `event`.
///
/// `now` stamps `updatedAt`, and `createdAt` when the event has none yet.
pub fn to_stored_record(event: &CanonicalEvent, published_by: &str, now: DateTime<Utc>) -> RawRecord {
    let timestamp = Value::String(now.to_rfc3339_opts(SecondsFormat::Secs, true));
    let created_at = if event.created_at.is_null() {
        timestamp.clone()
    } else {
        event.created_at.clone()
    };

    let document = json!({
        "title": event.title,
        "summary": event.summary,
        "description": event.description,
        "tags": event.tags,
        // empty means every department may see the event
        "target_departments": [],
        "event_type": event.event_type,
        "priority": event.priority,
        "venue": event.venue,
        "start_time": event.start_time.as_str(),
        "end_time": event.end_time.as_str(),
        "published_by": published_by,
        "createdAt": created_at,
        "updatedAt": timestamp,
    });

    match document {
        Value::Object(map) => map,
        _ => RawRecord::new(),
    }
}
