mod common;

use campus_notifier::events::{
    apply, distinct_departments, distinct_event_types, sort_by_start, timeline, DateRange,
    FilterAxis, FilterCriteria, Normalizer, ALL_DEPARTMENTS,
};
use campus_notifier::store::{load_events, EventStoreWriter, InMemoryEventStore, StoredRecord};
use chrono::NaiveDate;
use common::record;
use serde_json::json;

/// One collection holding every historical document shape
fn mixed_store() -> InMemoryEventStore {
    InMemoryEventStore::with_records(vec![
        StoredRecord::new(
            "evt_001",
            record(json!({
                "title_raw": "Exam Notice",
                "department_tags": ["CS"],
                "event_type": "Exam",
                "start_time": "2024-12-18T09:00:00",
                "priority": "critical"
            })),
        ),
        StoredRecord::new(
            "evt_002",
            record(json!({
                "title": "Robotics Workshop",
                "summary": "Build a line follower",
                "tags": ["ECE", "Mech"],
                "eventType": "Workshop",
                "startTime": "2024-12-10T14:00:00",
                "endTime": "2024-12-10T17:00:00",
                "venue": "Lab 4",
                "createdAt": "2024-11-30T08:00:00Z"
            })),
        ),
        StoredRecord::new(
            "evt_003",
            record(json!({
                "title_ai": "Winter Break",
                "description_ai": "Campus closed.",
                "tags": [ALL_DEPARTMENTS],
                "event_type": "general",
                "start_time": "TBD"
            })),
        ),
        StoredRecord::new(
            "evt_004",
            record(json!({
                "title": "Guest Seminar",
                "tags": "CS, Math",
                "event_type": "seminar",
                "priority": "important",
                "start_time": "2024-12-05"
            })),
        ),
        // no storage key and no embedded id: discarded
        StoredRecord::new("", record(json!({ "title": "Orphan" }))),
    ])
}

async fn events() -> Vec<campus_notifier::events::CanonicalEvent> {
    load_events(&mixed_store(), &Normalizer::default()).await.unwrap()
}

#[tokio::test]
async fn test_mixed_shapes_normalize_and_orphans_are_dropped() {
    let events = events().await;
    assert_eq!(events.len(), 4);

    let exam = &events[0];
    assert_eq!(exam.id, "evt_001");
    assert_eq!(exam.title, "Exam Notice");
    assert_eq!(exam.tags, vec!["CS"]);
    assert_eq!(exam.event_type, "Exam");
    assert_eq!(exam.priority, "critical");
    assert_eq!(exam.start_time.as_str(), "2024-12-18T09:00:00");
    assert_eq!(exam.end_time.as_str(), "TBD");
    assert_eq!(exam.venue, "TBD");
    assert_eq!(exam.summary, "");
    assert_eq!(exam.description, "");

    assert_eq!(events[1].event_type, "Workshop");
    assert_eq!(events[1].priority, "normal");
    assert_eq!(events[2].title, "Winter Break");
    assert_eq!(events[3].tags, vec!["CS", "Math"]);
}

#[tokio::test]
async fn test_timeline_sorts_known_times_first() {
    let events = events().await;
    let ids: Vec<String> = timeline(&events, &FilterCriteria::new())
        .into_iter()
        .map(|e| e.id)
        .collect();

    assert_eq!(ids, vec!["evt_004", "evt_002", "evt_001", "evt_003"]);
}

#[tokio::test]
async fn test_event_type_filter_keeps_order() {
    let events = events().await;
    let criteria = FilterCriteria::new().toggle(FilterAxis::EventTypes, "Workshop");

    let matched = apply(&events, &criteria);

    assert_eq!(matched.len(), 1);
    assert_eq!(matched[0].id, "evt_002");
}

#[tokio::test]
async fn test_department_filter_includes_everyone_events() {
    let events = events().await;
    let criteria = FilterCriteria::new().toggle(FilterAxis::Departments, "CS");

    let ids: Vec<String> = apply(&events, &criteria).into_iter().map(|e| e.id).collect();

    assert_eq!(ids, vec!["evt_001", "evt_003", "evt_004"]);
}

#[tokio::test]
async fn test_combined_axes_and_date_range() {
    let events = events().await;
    let december_first_half = DateRange::days(
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap(),
        NaiveDate::from_ymd_opt(2024, 12, 15).unwrap(),
    )
    .unwrap();
    let criteria = FilterCriteria::new().with_date_range(Some(december_first_half));

    let ids: Vec<String> = timeline(&events, &criteria).into_iter().map(|e| e.id).collect();
    // the TBD event has no start and cannot fall inside a range
    assert_eq!(ids, vec!["evt_004", "evt_002"]);

    let narrowed = criteria
        .toggle(FilterAxis::Priorities, "important")
        .toggle(FilterAxis::Departments, "Math");
    assert_eq!(narrowed.active_count(), 3);
    let ids: Vec<String> = apply(&events, &narrowed).into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["evt_004"]);

    assert!(!narrowed.clear_all().is_active());
}

#[tokio::test]
async fn test_filter_laws_hold_on_real_data() {
    let events = events().await;
    let criteria = FilterCriteria::new()
        .toggle(FilterAxis::Departments, "ECE")
        .toggle(FilterAxis::Priorities, "normal");

    assert_eq!(apply(&events, &FilterCriteria::new()), events);
    let once = apply(&events, &criteria);
    assert_eq!(apply(&once, &criteria), once);

    let toggled_twice = criteria
        .toggle(FilterAxis::Departments, "CS")
        .toggle(FilterAxis::Departments, "CS");
    assert_eq!(toggled_twice, criteria);

    let sorted = sort_by_start(events.clone());
    assert_eq!(sort_by_start(sorted.clone()), sorted);
}

#[tokio::test]
async fn test_facets_list_values_in_first_seen_order() {
    let events = events().await;

    assert_eq!(
        distinct_departments(&events),
        vec!["CS", "ECE", "Mech", ALL_DEPARTMENTS, "Math"]
    );
    assert_eq!(
        distinct_event_types(&events),
        vec!["Exam", "Workshop", "general", "seminar"]
    );
}

#[tokio::test]
async fn test_live_feed_delivers_new_records() {
    let store = mixed_store();
    let mut feed = store.subscribe();

    store
        .write_record(
            "evt_005",
            record(json!({ "title": "Blood Drive", "tags": ["All Departments"] })),
        )
        .await
        .unwrap();

    feed.changed().await.unwrap();
    let snapshot = feed.borrow_and_update().clone();
    let events = campus_notifier::store::normalize_records(&Normalizer::default(), &snapshot);
    assert_eq!(events.len(), 5);
    assert!(events.iter().any(|e| e.id == "evt_005" && e.is_for_all_departments()));
}
