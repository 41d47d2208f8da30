//! Tests for the self-contained JSON request envelopes.

use chrono::{TimeZone, Utc};
use slot_engine::error::SlotError;
use slot_engine::request::{FreeSlotsRequest, MaterializeRequest};

const FREE_REQUEST: &str = r#"{
    "policy": {
        "slot_duration_minutes": 60,
        "timezone": "Europe/Berlin",
        "availability": {"monday": [{"start": "09:00", "end": "12:00"}]},
        "recurrence": {"cadences": ["weekly"], "max_series": 4}
    },
    "query": {
        "resource": {"resource_id": "room-1", "tenant_id": "tenant-a"},
        "from": "2026-03-02",
        "to": "2026-03-02"
    },
    "now": "2026-03-01T00:00:00Z",
    "occupied": [
        {"start": "2026-03-02T09:00:00Z", "end": "2026-03-02T10:00:00Z"},
        {"start": "2026-03-16T08:00:00Z", "end": "2026-03-16T09:00:00Z"}
    ]
}"#;

#[test]
fn free_slots_request_round_trips_through_json() {
    let request = FreeSlotsRequest::from_json(FREE_REQUEST).unwrap();
    let result = request.evaluate(Utc::now()).unwrap();

    // 09:00 and 11:00 CET are free; 10:00 CET (09:00Z) is booked.
    let starts: Vec<_> = result.slots.iter().map(|s| s.time.to_string()).collect();
    assert_eq!(starts, vec!["09:00:00", "11:00:00"]);
    // 09:00 CET on 2026-03-16 is taken, so the first slot repeats twice.
    assert_eq!(result.slots[0].available_recurrences, Some(2));
    assert_eq!(result.slots[1].available_recurrences, Some(4));

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["slots"][0]["start"], "2026-03-02T08:00:00Z");
    assert_eq!(json["slots"][0]["date"], "2026-03-02");
    assert_eq!(json["slots"][0]["time_of_day"], "morning");
    assert_eq!(json["days"][0]["status"], "available");
    assert_eq!(json["config"]["availability"]["source"], "template");
}

#[test]
fn request_now_takes_precedence_over_clock() {
    let request = FreeSlotsRequest::from_json(FREE_REQUEST).unwrap();
    let late_clock = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(request.evaluate(late_clock).unwrap().slots.len(), 2);
}

#[test]
fn clock_is_used_when_request_has_no_now() {
    let mut request = FreeSlotsRequest::from_json(FREE_REQUEST).unwrap();
    request.now = None;
    let late_clock = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    assert!(request.evaluate(late_clock).unwrap().slots.is_empty());
}

#[test]
fn malformed_json_is_an_invalid_request() {
    assert!(matches!(
        FreeSlotsRequest::from_json("{not json"),
        Err(SlotError::InvalidRequest(_))
    ));
}

#[test]
fn unknown_cadence_in_policy_is_rejected() {
    let json = FREE_REQUEST.replace("\"weekly\"", "\"biweekly\"");
    assert!(FreeSlotsRequest::from_json(&json).is_err());
}

const SERIES_REQUEST: &str = r#"{
    "policy": {"recurrence": {"cadences": ["weekly"], "max_series": 10}},
    "series": {
        "resource": {"resource_id": "room-1", "tenant_id": "tenant-a"},
        "start": "2026-03-02T10:00:00Z",
        "end": "2026-03-02T11:00:00Z",
        "cadence": "weekly",
        "count": 5
    },
    "occupied": [
        {"start": "2026-03-16T10:30:00Z", "end": "2026-03-16T11:30:00Z"}
    ]
}"#;

#[test]
fn materialize_request_truncates_at_conflict() {
    let request = MaterializeRequest::from_json(SERIES_REQUEST).unwrap();
    let series = request.evaluate().unwrap();

    assert_eq!(series.created.len(), 2);
    assert!(series.is_truncated());
}

#[test]
fn materialize_request_first_conflict_fails() {
    let json = SERIES_REQUEST.replace("2026-03-16T10:30:00Z", "2026-03-02T10:30:00Z");
    let request = MaterializeRequest::from_json(&json).unwrap();
    assert!(matches!(
        request.evaluate(),
        Err(SlotError::FirstOccurrenceConflict(_))
    ));
}
