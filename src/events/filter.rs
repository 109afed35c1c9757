//! Timeline filtering over canonical events.
//!
//! Axes combine conjunctively; values within one axis combine disjunctively.
//! Criteria are plain values: every edit returns a new [`FilterCriteria`], so a
//! snapshot held elsewhere never changes underneath its reader.

use super::models::CanonicalEvent;
use chrono::{NaiveDate, NaiveDateTime};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};

/// Inclusive window on event start times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl DateRange {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// From the first instant of `from` to the last second of `to`
    pub fn days(from: NaiveDate, to: NaiveDate) -> Option<Self> {
        Some(Self {
            start: from.and_hms_opt(0, 0, 0)?,
            end: to.and_hms_opt(23, 59, 59)?,
        })
    }

    /// An inverted range simply contains nothing
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        self.start <= at && at <= self.end
    }
}

/// The set-valued filter axes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterAxis {
    Departments,
    EventTypes,
    Priorities,
}

/// Selected filter values; an empty axis places no restriction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub departments: BTreeSet<String>,
    pub event_types: BTreeSet<String>,
    pub priorities: BTreeSet<String>,
    pub date_range: Option<DateRange>,
}

impl FilterCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn axis(&self, axis: FilterAxis) -> &BTreeSet<String> {
        match axis {
            FilterAxis::Departments => &self.departments,
            FilterAxis::EventTypes => &self.event_types,
            FilterAxis::Priorities => &self.priorities,
        }
    }

    /// Copy with `value` added to the axis if absent, removed if present
    pub fn toggle(&self, axis: FilterAxis, value: &str) -> Self {
        let mut next = self.clone();
        let set = match axis {
            FilterAxis::Departments => &mut next.departments,
            FilterAxis::EventTypes => &mut next.event_types,
            FilterAxis::Priorities => &mut next.priorities,
        };
        if !set.remove(value) {
            set.insert(value.to_string());
        }
        next
    }

    pub fn with_date_range(&self, range: Option<DateRange>) -> Self {
        Self {
            date_range: range,
            ..self.clone()
        }
    }

    /// Criteria with every axis cleared
    pub fn clear_all(&self) -> Self {
        Self::default()
    }

    /// Number of axes currently restricting the timeline
    pub fn active_count(&self) -> usize {
        [
            !self.departments.is_empty(),
            !self.event_types.is_empty(),
            !self.priorities.is_empty(),
            self.date_range.is_some(),
        ]
        .into_iter()
        .filter(|active| *active)
        .count()
    }

    pub fn is_active(&self) -> bool {
        self.active_count() > 0
    }

    /// Whether a single event passes every active axis
    pub fn matches(&self, event: &CanonicalEvent) -> bool {
        let department_ok = self.departments.is_empty()
            || event.is_for_all_departments()
            || event.tags.iter().any(|tag| self.departments.contains(tag));

        let type_ok = self.event_types.is_empty() || self.event_types.contains(&event.event_type);

        let priority_ok = self.priorities.is_empty() || self.priorities.contains(&event.priority);

        let date_ok = match &self.date_range {
            None => true,
            Some(range) => event
                .start_time
                .instant()
                .is_some_and(|at| range.contains(at)),
        };

        department_ok && type_ok && priority_ok && date_ok
    }
}

/// Events passing `criteria`, in their original order
pub fn apply(events: &[CanonicalEvent], criteria: &FilterCriteria) -> Vec<CanonicalEvent> {
    events
        .iter()
        .filter(|event| criteria.matches(event))
        .cloned()
        .collect()
}

/// Order two events by start time; unknown times go last and compare equal
pub fn compare_start(a: &CanonicalEvent, b: &CanonicalEvent) -> Ordering {
    match (a.start_time.instant(), b.start_time.instant()) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Stable ascending sort by start time
pub fn sort_by_start(mut events: Vec<CanonicalEvent>) -> Vec<CanonicalEvent> {
    events.sort_by(compare_start);
    events
}

/// Filter then sort, the order the student timeline is shown in
pub fn timeline(events: &[CanonicalEvent], criteria: &FilterCriteria) -> Vec<CanonicalEvent> {
    sort_by_start(apply(events, criteria))
}

/// Department tags present in `events`, first appearance first
pub fn distinct_departments(events: &[CanonicalEvent]) -> Vec<String> {
    distinct(events.iter().flat_map(|event| event.tags.iter()))
}

/// Event types present in `events`, first appearance first
pub fn distinct_event_types(events: &[CanonicalEvent]) -> Vec<String> {
    distinct(events.iter().map(|event| &event.event_type))
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::models::ALL_DEPARTMENTS;
    use crate::events::time::EventTime;
    use serde_json::Value;

    fn event(id: &str, tags: &[&str], event_type: &str, priority: &str, start: &str) -> CanonicalEvent {
        CanonicalEvent {
            id: id.to_string(),
            title: id.to_string(),
            summary: String::new(),
            description: String::new(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            event_type: event_type.to_string(),
            priority: priority.to_string(),
            venue: "TBD".to_string(),
            start_time: EventTime::parse(start),
            end_time: EventTime::unknown(),
            created_at: Value::Null,
            updated_at: Value::Null,
        }
    }

    fn sample() -> Vec<CanonicalEvent> {
        vec![
            event("exam", &["Computer Science", "Academics"], "Exam", "critical", "2024-12-18T09:00:00"),
            event("aws", &["Computer Science", "Information Technology"], "Workshop", "normal", "2024-12-20T14:00:00"),
            event("fest", &["Cultural Committee", ALL_DEPARTMENTS], "Cultural", "normal", "2024-12-21T10:00:00"),
            event("grants", &["Financial Aid"], "Deadline", "important", "TBD"),
        ]
    }

    fn ids(events: &[CanonicalEvent]) -> Vec<&str> {
        events.iter().map(|e| e.id.as_str()).collect()
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_empty_criteria_is_identity() {
        let events = sample();
        assert_eq!(apply(&events, &FilterCriteria::new()), events);
    }

    #[test]
    fn test_single_event_type() {
        let events: Vec<_> = sample().into_iter().take(3).collect();
        let criteria = FilterCriteria::new().toggle(FilterAxis::EventTypes, "Workshop");
        assert_eq!(ids(&apply(&events, &criteria)), vec!["aws"]);
    }

    #[test]
    fn test_departments_are_disjunctive() {
        let criteria = FilterCriteria::new()
            .toggle(FilterAxis::Departments, "Academics")
            .toggle(FilterAxis::Departments, "Information Technology");
        // fest carries the all-departments sentinel
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["exam", "aws", "fest"]);
    }

    #[test]
    fn test_sentinel_passes_any_department() {
        let criteria = FilterCriteria::new().toggle(FilterAxis::Departments, "Mechanical");
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["fest"]);
    }

    #[test]
    fn test_untagged_event_reaches_everyone() {
        let events = vec![event("global", &[], "general", "normal", "TBD")];
        let criteria = FilterCriteria::new().toggle(FilterAxis::Departments, "Physics");
        assert_eq!(ids(&apply(&events, &criteria)), vec!["global"]);
    }

    #[test]
    fn test_axes_are_conjunctive() {
        let criteria = FilterCriteria::new()
            .toggle(FilterAxis::Departments, "Computer Science")
            .toggle(FilterAxis::Priorities, "normal");
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["aws", "fest"]);
    }

    #[test]
    fn test_date_range_excludes_unknown_starts() {
        let range = DateRange::days(day("2024-12-18"), day("2024-12-20"));
        let criteria = FilterCriteria::new().with_date_range(range);
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["exam", "aws"]);

        let inverted = DateRange::days(day("2024-12-21"), day("2024-12-18"));
        assert!(apply(&sample(), &FilterCriteria::new().with_date_range(inverted)).is_empty());
    }

    #[test]
    fn test_date_range_bounds_are_inclusive() {
        let start = NaiveDateTime::parse_from_str("2024-12-20 14:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let criteria = FilterCriteria::new().with_date_range(Some(DateRange::new(start, start)));
        assert_eq!(ids(&apply(&sample(), &criteria)), vec!["aws"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let criteria = FilterCriteria::new()
            .toggle(FilterAxis::Departments, "Computer Science")
            .with_date_range(DateRange::days(day("2024-12-01"), day("2024-12-31")));
        let once = apply(&sample(), &criteria);
        assert_eq!(apply(&once, &criteria), once);
    }

    #[test]
    fn test_toggle_is_self_inverse_and_copy_on_write() {
        let original = FilterCriteria::new().toggle(FilterAxis::Priorities, "critical");
        let toggled = original.toggle(FilterAxis::Departments, "CS");

        assert!(original.departments.is_empty());
        assert!(toggled.departments.contains("CS"));
        assert_eq!(toggled.toggle(FilterAxis::Departments, "CS"), original);
    }

    #[test]
    fn test_active_count_and_clear() {
        let criteria = FilterCriteria::new()
            .toggle(FilterAxis::EventTypes, "Exam")
            .with_date_range(DateRange::days(day("2024-12-01"), day("2024-12-02")));
        assert_eq!(criteria.active_count(), 2);
        assert!(criteria.is_active());
        assert!(!criteria.clear_all().is_active());
        assert!(criteria.axis(FilterAxis::EventTypes).contains("Exam"));
    }

    #[test]
    fn test_sort_by_start_puts_unknown_last_stably() {
        let events = vec![
            event("tbd-1", &[], "general", "normal", "TBD"),
            event("late", &[], "general", "normal", "2024-12-21T10:00:00"),
            event("prose", &[], "general", "normal", "sometime"),
            event("early", &[], "general", "normal", "2024-12-18T09:00:00"),
            event("early-twin", &[], "general", "normal", "2024-12-18T09:00:00"),
        ];

        let sorted = sort_by_start(events);
        assert_eq!(ids(&sorted), vec!["early", "early-twin", "late", "tbd-1", "prose"]);
        assert_eq!(sort_by_start(sorted.clone()), sorted);
    }

    #[test]
    fn test_timeline_filters_then_sorts() {
        let criteria = FilterCriteria::new().toggle(FilterAxis::Priorities, "normal");
        let mut events = sample();
        events.reverse();
        assert_eq!(ids(&timeline(&events, &criteria)), vec!["aws", "fest"]);
    }

    #[test]
    fn test_facets_follow_first_appearance() {
        let events = sample();
        assert_eq!(
            distinct_departments(&events),
            vec![
                "Computer Science",
                "Academics",
                "Information Technology",
                "Cultural Committee",
                ALL_DEPARTMENTS,
                "Financial Aid"
            ]
        );
        assert_eq!(
            distinct_event_types(&events),
            vec!["Exam", "Workshop", "Cultural", "Deadline"]
        );
        assert!(distinct_departments(&[]).is_empty());
    }
}
