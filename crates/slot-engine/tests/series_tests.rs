//! Tests for the recurring series materializer.

use std::cell::Cell;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use slot_engine::cadence::Cadence;
use slot_engine::conflict::OccupiedInterval;
use slot_engine::error::{Result, SlotError};
use slot_engine::policy::{RecurrencePolicy, SlotPolicy};
use slot_engine::schedule::WeeklyAvailability;
use slot_engine::series::{materialize_series, SeriesRequest};
use slot_engine::store::{
    InMemoryStore, IntervalId, NewInterval, OccupancyReader, OccupancyWriter, ResourceRef,
    SeriesHeader, SeriesId,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

fn room() -> ResourceRef {
    ResourceRef::new("room-1", "tenant-a")
}

fn booked(y: i32, m: u32, d: u32) -> OccupiedInterval {
    OccupiedInterval {
        start: utc(y, m, d, 10, 0),
        end: utc(y, m, d, 11, 0),
    }
}

fn weekly_policy(max_series: u32) -> SlotPolicy {
    SlotPolicy {
        slot_duration_minutes: 60,
        recurrence: RecurrencePolicy {
            cadences: vec![Cadence::Weekly, Cadence::MonthlyDay],
            max_series,
            ..RecurrencePolicy::default()
        },
        ..SlotPolicy::default()
    }
}

/// Weekly from Monday 2026-03-02 10:00-11:00 UTC.
fn weekly_request(count: u32) -> SeriesRequest {
    SeriesRequest {
        resource: room(),
        start: utc(2026, 3, 2, 10, 0),
        end: utc(2026, 3, 2, 11, 0),
        cadence: Cadence::Weekly,
        count,
    }
}

// ── Truncation semantics ────────────────────────────────────────────────────

#[test]
fn conflict_at_third_occurrence_creates_two() {
    let mut store = InMemoryStore::new();
    store.insert(&room(), booked(2026, 3, 16));

    let series = materialize_series(&mut store, &weekly_request(5), &weekly_policy(10)).unwrap();

    assert_eq!(series.created.len(), 2);
    assert_eq!(series.requested, 5);
    assert!(series.is_truncated());
    assert_eq!(series.created[0].start, utc(2026, 3, 2, 10, 0));
    assert_eq!(series.created[1].start, utc(2026, 3, 9, 10, 0));
    assert_eq!(series.created[1].position, 2);

    // 1 pre-existing booking + 2 new ones, all linked to the series.
    assert_eq!(store.intervals().len(), 3);
    let linked = store
        .intervals()
        .iter()
        .filter(|s| s.series_id == Some(series.series_id))
        .count();
    assert_eq!(linked, 2);
}

#[test]
fn conflict_at_first_occurrence_fails_and_writes_nothing() {
    let mut store = InMemoryStore::new();
    store.insert(&room(), booked(2026, 3, 2));

    let result = materialize_series(&mut store, &weekly_request(5), &weekly_policy(10));

    assert!(matches!(result, Err(SlotError::FirstOccurrenceConflict(_))));
    assert_eq!(store.series_count(), 0);
    assert_eq!(store.intervals().len(), 1);
}

#[test]
fn full_series_when_nothing_conflicts() {
    let mut store = InMemoryStore::new();

    let series = materialize_series(&mut store, &weekly_request(4), &weekly_policy(10)).unwrap();

    assert!(!series.is_truncated());
    let positions: Vec<u32> = series.created.iter().map(|c| c.position).collect();
    assert_eq!(positions, vec![1, 2, 3, 4]);
    assert_eq!(series.created[3].start, utc(2026, 3, 23, 10, 0));

    let header = store.series_header(series.series_id).unwrap();
    assert_eq!(header.cadence, Cadence::Weekly);
    assert_eq!(header.requested, 4);
}

#[test]
fn bookings_of_other_resources_are_ignored() {
    let mut store = InMemoryStore::new();
    store.insert(&ResourceRef::new("room-2", "tenant-a"), booked(2026, 3, 2));
    store.insert(&ResourceRef::new("room-1", "tenant-b"), booked(2026, 3, 9));

    let series = materialize_series(&mut store, &weekly_request(3), &weekly_policy(10)).unwrap();
    assert_eq!(series.created.len(), 3);
}

#[test]
fn buffer_is_honoured_between_occurrences_and_bookings() {
    let mut store = InMemoryStore::new();
    // Ends 09:50 on the second occurrence's day.
    store.insert(
        &room(),
        OccupiedInterval {
            start: utc(2026, 3, 9, 9, 0),
            end: utc(2026, 3, 9, 9, 50),
        },
    );
    let policy = SlotPolicy {
        buffer_minutes: 15,
        ..weekly_policy(10)
    };

    let series = materialize_series(&mut store, &weekly_request(5), &policy).unwrap();
    assert_eq!(series.created.len(), 1);
}

#[test]
fn monthly_day_series_follows_nth_weekday() {
    let mut store = InMemoryStore::new();
    let request = SeriesRequest {
        start: utc(2026, 3, 12, 10, 0),
        end: utc(2026, 3, 12, 11, 0),
        cadence: Cadence::MonthlyDay,
        ..weekly_request(3)
    };

    let series = materialize_series(&mut store, &request, &weekly_policy(10)).unwrap();

    let days: Vec<NaiveDate> = series.created.iter().map(|c| c.start.date_naive()).collect();
    assert_eq!(
        days,
        vec![
            NaiveDate::from_ymd_opt(2026, 3, 12).unwrap(),
            NaiveDate::from_ymd_opt(2026, 4, 9).unwrap(),
            NaiveDate::from_ymd_opt(2026, 5, 14).unwrap(),
        ]
    );
}

// ── Clamping and validation ─────────────────────────────────────────────────

#[test]
fn requested_count_is_clamped_to_policy_cap() {
    let mut store = InMemoryStore::new();
    let series = materialize_series(&mut store, &weekly_request(20), &weekly_policy(4)).unwrap();

    assert_eq!(series.requested, 4);
    assert_eq!(series.created.len(), 4);
    assert!(!series.is_truncated());
}

#[test]
fn none_cadence_books_a_single_occurrence() {
    let mut store = InMemoryStore::new();
    let request = SeriesRequest {
        cadence: Cadence::None,
        ..weekly_request(5)
    };
    let series = materialize_series(&mut store, &request, &SlotPolicy::default()).unwrap();

    assert_eq!(series.requested, 1);
    assert_eq!(series.created.len(), 1);
}

#[test]
fn cadence_outside_policy_is_rejected() {
    let mut store = InMemoryStore::new();
    let request = SeriesRequest {
        cadence: Cadence::Yearly,
        ..weekly_request(3)
    };
    let result = materialize_series(&mut store, &request, &weekly_policy(10));

    assert!(matches!(
        result,
        Err(SlotError::CadenceNotAllowed(Cadence::Yearly))
    ));
    assert_eq!(store.series_count(), 0);
}

#[test]
fn zero_count_is_rejected() {
    let mut store = InMemoryStore::new();
    let result = materialize_series(&mut store, &weekly_request(0), &weekly_policy(10));
    assert!(matches!(result, Err(SlotError::InvalidCount(0))));
}

#[test]
fn zero_count_is_ignored_for_a_single_booking() {
    let mut store = InMemoryStore::new();
    let request = SeriesRequest {
        cadence: Cadence::None,
        ..weekly_request(0)
    };
    let series = materialize_series(&mut store, &request, &weekly_policy(10)).unwrap();

    assert_eq!(series.requested, 1);
    assert_eq!(series.created.len(), 1);
}

#[test]
fn inverted_booking_is_rejected() {
    let mut store = InMemoryStore::new();
    let request = SeriesRequest {
        end: utc(2026, 3, 2, 9, 0),
        ..weekly_request(2)
    };
    let result = materialize_series(&mut store, &request, &weekly_policy(10));
    assert!(matches!(result, Err(SlotError::InvalidDateRange(_))));
}

// ── Buffers across day boundaries ───────────────────────────────────────────

/// Holds plain intervals, answers reads with exactly the ones touching the
/// requested instants and remembers the window it was asked for.
#[derive(Default)]
struct StrictStore {
    occupied: Vec<OccupiedInterval>,
    written: Vec<NewInterval>,
    series: u64,
    window: Cell<Option<(DateTime<Utc>, DateTime<Utc>)>>,
}

impl OccupancyReader for StrictStore {
    fn fetch_occupied_intervals(
        &self,
        _resource: &ResourceRef,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OccupiedInterval>> {
        self.window.set(Some((from, to)));
        Ok(self
            .occupied
            .iter()
            .filter(|i| i.start <= to && i.end >= from)
            .copied()
            .collect())
    }

    fn fetch_resource_default_availability(
        &self,
        _resource: &ResourceRef,
    ) -> Result<Option<WeeklyAvailability>> {
        Ok(None)
    }
}

impl OccupancyWriter for StrictStore {
    fn create_series(&mut self, _resource: &ResourceRef, _header: &SeriesHeader) -> Result<SeriesId> {
        self.series += 1;
        Ok(self.series)
    }

    fn create_occupied_interval(
        &mut self,
        _resource: &ResourceRef,
        interval: &NewInterval,
    ) -> Result<IntervalId> {
        self.written.push(interval.clone());
        Ok(self.written.len() as IntervalId)
    }
}

#[test]
fn booking_late_the_previous_evening_blocks_a_midnight_series() {
    let mut store = StrictStore {
        occupied: vec![OccupiedInterval {
            start: utc(2026, 3, 1, 23, 0),
            end: utc(2026, 3, 1, 23, 45),
        }],
        ..StrictStore::default()
    };
    let request = SeriesRequest {
        start: utc(2026, 3, 2, 0, 0),
        end: utc(2026, 3, 2, 1, 0),
        ..weekly_request(3)
    };
    let policy = SlotPolicy {
        buffer_minutes: 30,
        ..weekly_policy(10)
    };

    let result = materialize_series(&mut store, &request, &policy);

    assert!(matches!(result, Err(SlotError::FirstOccurrenceConflict(_))));
    assert_eq!(store.series, 0);
    assert!(store.written.is_empty());
}

#[test]
fn booking_just_after_midnight_truncates_the_last_occurrence() {
    let mut store = StrictStore {
        occupied: vec![OccupiedInterval {
            start: utc(2026, 3, 17, 0, 0),
            end: utc(2026, 3, 17, 0, 20),
        }],
        ..StrictStore::default()
    };
    let request = SeriesRequest {
        start: utc(2026, 3, 2, 22, 0),
        end: utc(2026, 3, 2, 23, 0),
        ..weekly_request(3)
    };
    let policy = SlotPolicy {
        buffer_minutes: 90,
        ..weekly_policy(10)
    };

    let series = materialize_series(&mut store, &request, &policy).unwrap();

    assert_eq!(series.created.len(), 2);
    assert!(series.is_truncated());
    assert_eq!(
        store.window.get(),
        Some((utc(2026, 3, 2, 20, 30), utc(2026, 3, 17, 0, 30)))
    );
}

// ── Store failures ──────────────────────────────────────────────────────────

/// Reads succeed; every interval write after `fail_after` successes fails.
struct FlakyStore {
    inner: InMemoryStore,
    fail_after: usize,
    writes: usize,
}

impl OccupancyReader for FlakyStore {
    fn fetch_occupied_intervals(
        &self,
        resource: &ResourceRef,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<OccupiedInterval>> {
        self.inner.fetch_occupied_intervals(resource, from, to)
    }

    fn fetch_resource_default_availability(
        &self,
        resource: &ResourceRef,
    ) -> Result<Option<WeeklyAvailability>> {
        self.inner.fetch_resource_default_availability(resource)
    }
}

impl OccupancyWriter for FlakyStore {
    fn create_series(&mut self, resource: &ResourceRef, header: &SeriesHeader) -> Result<SeriesId> {
        self.inner.create_series(resource, header)
    }

    fn create_occupied_interval(
        &mut self,
        resource: &ResourceRef,
        interval: &NewInterval,
    ) -> Result<IntervalId> {
        if self.writes >= self.fail_after {
            return Err(SlotError::store("disk full"));
        }
        self.writes += 1;
        self.inner.create_occupied_interval(resource, interval)
    }
}

#[test]
fn write_failure_is_propagated() {
    let mut store = FlakyStore {
        inner: InMemoryStore::new(),
        fail_after: 2,
        writes: 0,
    };

    let result = materialize_series(&mut store, &weekly_request(5), &weekly_policy(10));

    match result {
        Err(SlotError::Store(source)) => assert_eq!(source.to_string(), "disk full"),
        other => panic!("expected store error, got {:?}", other),
    }
    // Writes are not rolled back.
    assert_eq!(store.inner.intervals().len(), 2);
}
