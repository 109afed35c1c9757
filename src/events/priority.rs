use serde::{Deserialize, Serialize};

/// Priority vocabulary used when none is configured, lowest first
pub const DEFAULT_PRIORITY_LEVELS: [&str; 3] = ["normal", "important", "critical"];

/// Ordered severity vocabulary, lowest level first.
///
/// The concrete words are configurable because stored documents were written
/// with more than one vocabulary over time. Values outside the scale are kept
/// on the event as-is; they simply have no rank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityScale {
    levels: Vec<String>,
}

impl PriorityScale {
    /// Build a scale from levels ordered lowest to highest.
    ///
    /// Blank entries are dropped; an empty list falls back to the default scale.
    pub fn new<I, S>(levels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let levels: Vec<String> = levels
            .into_iter()
            .map(Into::into)
            .map(|level| level.trim().to_string())
            .filter(|level| !level.is_empty())
            .collect();

        if levels.is_empty() {
            Self::default()
        } else {
            Self { levels }
        }
    }

    /// Parse a comma-separated list such as `normal,medium,high`
    pub fn parse(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// The level applied when a record carries no priority
    pub fn lowest(&self) -> &str {
        // `new` never stores an empty list
        self.levels.first().map(String::as_str).unwrap_or("normal")
    }

    /// Position of `value` on the scale, compared case-insensitively
    pub fn rank(&self, value: &str) -> Option<usize> {
        let value = value.trim();
        self.levels
            .iter()
            .position(|level| level.eq_ignore_ascii_case(value))
    }

    /// Whether the value sits above the lowest level and deserves emphasis
    pub fn is_elevated(&self, value: &str) -> bool {
        self.rank(value).is_some_and(|rank| rank > 0)
    }

    pub fn levels(&self) -> &[String] {
        &self.levels
    }
}

impl Default for PriorityScale {
    fn default() -> Self {
        Self {
            levels: DEFAULT_PRIORITY_LEVELS.iter().map(|l| l.to_string()).collect(),
        }
    }
}
