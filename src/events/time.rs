use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Placeholder written for times nobody knows yet
pub const UNKNOWN_TIME: &str = "TBD";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Start or end time of an event.
///
/// Stored documents carry times as free-form strings: ISO 8601 with or without
/// an offset, a bare date, `TBD`, or occasionally prose. Parseable values
/// become `Known` and keep their original text for the storage boundary;
/// anything else is `Unknown` with the literal preserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    Known { at: NaiveDateTime, text: String },
    Unknown(String),
}

impl EventTime {
    /// Interpret a stored time string. Never fails.
    pub fn parse(text: &str) -> Self {
        if text.trim().is_empty() {
            return Self::unknown();
        }

        match parse_instant(text.trim()) {
            Some(at) => Self::Known {
                at,
                text: text.to_string(),
            },
            None => Self::Unknown(text.to_string()),
        }
    }

    /// The `TBD` placeholder
    pub fn unknown() -> Self {
        Self::Unknown(UNKNOWN_TIME.to_string())
    }

    /// The instant used for ordering and date-range checks, in UTC
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Known { at, .. } => Some(*at),
            Self::Unknown(_) => None,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known { .. })
    }

    /// The literal as it is written back to storage
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known { text, .. } => text,
            Self::Unknown(text) => text,
        }
    }
}

impl Default for EventTime {
    fn default() -> Self {
        Self::unknown()
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl From<&str> for EventTime {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl Serialize for EventTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::parse(&text))
    }
}

/// Parse a time string to a UTC instant.
///
/// Offset-bearing values are converted to UTC; naive values are taken as UTC
/// already; a bare date means midnight.
pub fn parse_instant(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}
