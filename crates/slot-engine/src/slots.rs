//! Tile weekly availability windows into fixed-duration candidate slots.
//!
//! For every day in the requested range, each availability window is walked from
//! its start. A candidate is emitted when it fits inside the window, starts inside
//! the notice/advance booking window, and its date is not blocked. With a
//! minute-alignment grid, starts snap to the next allowed minute of the hour.
//!
//! All wall-clock arithmetic happens in the resource timezone. A start time that
//! does not exist locally (DST spring-forward gap) yields no slot.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Timelike, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::{self, DstPolicy};
use crate::policy::SlotPolicy;
use crate::schedule::{TimeRange, WeeklyAvailability};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Coarse display bucket derived from the local start hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// Before 12:00
    Morning,
    /// 12:00 to before 18:00
    Afternoon,
    /// 18:00 onwards
    Evening,
}

impl TimeOfDay {
    pub fn from_hour(hour: u32) -> Self {
        if hour < 12 {
            TimeOfDay::Morning
        } else if hour < 18 {
            TimeOfDay::Afternoon
        } else {
            TimeOfDay::Evening
        }
    }
}

/// A bookable slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Local calendar date of the start.
    pub date: NaiveDate,
    /// Local wall-clock start.
    pub time: NaiveTime,
    pub time_of_day: TimeOfDay,
    pub duration_minutes: u32,
    /// Conflict-free consecutive occurrences, filled in by the recurrence counter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_recurrences: Option<u32>,
}

/// Generate candidate slots for every day in `[from, to]`.
///
/// Slots are returned sorted by start time. Overlapping windows on the same day
/// can yield overlapping slots; they are not de-duplicated.
pub fn generate_slots(
    availability: &WeeklyAvailability,
    policy: &SlotPolicy,
    from: NaiveDate,
    to: NaiveDate,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<CandidateSlot> {
    let mut slots = Vec::new();
    if policy.slot_duration_minutes == 0 {
        return slots;
    }

    for date in from.iter_days().take_while(|d| *d <= to) {
        if policy.is_blocked(date) {
            continue;
        }
        for window in availability.day(date.weekday()) {
            tile_window(date, window, policy, now, tz, &mut slots);
        }
    }

    slots.sort_by_key(|slot| slot.start);
    tracing::debug!(%from, %to, count = slots.len(), "generated candidate slots");
    slots
}

/// Walk one availability window, pushing every slot that passes the filters.
fn tile_window(
    date: NaiveDate,
    window: &TimeRange,
    policy: &SlotPolicy,
    now: DateTime<Utc>,
    tz: &Tz,
    out: &mut Vec<CandidateSlot>,
) {
    let grid = &policy.allowed_start_minutes;
    let duration = policy.slot_duration_minutes;
    let buffer = policy.buffer_minutes;
    let window_end = window.end_minute();
    let mut cursor = window.start_minute();

    while let Some(start) = snap_to_grid(grid, cursor) {
        let Some(end) = start.checked_add(duration).filter(|end| *end <= window_end) else {
            break;
        };

        if let Some(slot) = build_slot(date, start, policy, tz) {
            if policy.within_booking_window(slot.start, now) {
                out.push(slot);
            }
        }

        cursor = if !grid.is_empty() && buffer == 0 {
            start + 1
        } else {
            match end.checked_add(buffer) {
                Some(next) => next,
                None => break,
            }
        };
    }
}

/// The first minute-of-day at or after `cursor` whose minute-of-hour is in `grid`.
///
/// An empty grid accepts any minute. Never crosses midnight.
pub fn snap_to_grid(grid: &BTreeSet<u32>, cursor: u32) -> Option<u32> {
    if cursor >= MINUTES_PER_DAY {
        return None;
    }
    if grid.is_empty() {
        return Some(cursor);
    }
    (cursor / 60..24).find_map(|hour| {
        grid.iter()
            .map(|minute| hour * 60 + minute)
            .find(|candidate| *candidate >= cursor)
    })
}

fn build_slot(
    date: NaiveDate,
    start_minute: u32,
    policy: &SlotPolicy,
    tz: &Tz,
) -> Option<CandidateSlot> {
    let time = NaiveTime::from_hms_opt(start_minute / 60, start_minute % 60, 0)?;
    let start = dst::localize(tz, date.and_time(time), DstPolicy::Skip)?;
    Some(CandidateSlot {
        start,
        end: start + policy.duration(),
        date,
        time,
        time_of_day: TimeOfDay::from_hour(time.hour()),
        duration_minutes: policy.slot_duration_minutes,
        available_recurrences: None,
    })
}
